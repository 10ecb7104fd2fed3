use geojson::{Feature, FeatureCollection};
use serde::Serialize;

use crate::error::Result;
use crate::record::{AreaCategory, Shape, Timeline};

#[derive(Debug, Clone, Serialize)]
struct RecordProperties {
    time: f64,
    area: f64,
    area_category: AreaCategory,
}

impl Timeline {
    /// One feature per record in time order. Records without an outline
    /// become features without geometry so the time series stays complete.
    pub fn to_feature_collection(&self) -> Result<FeatureCollection> {
        let features = self
            .records()
            .enumerate()
            .map(|(index, record)| {
                let properties = RecordProperties {
                    time: record.time,
                    area: record.area,
                    area_category: record.area_category,
                };
                let polygon = match &record.shape {
                    Shape::Polygon { polygon } => polygon.clone(),
                    Shape::Box { bounds } => outline::Polygon::new(vec![
                        bounds.min,
                        scope_common::Point2D::new(bounds.max.x, bounds.min.y),
                        bounds.max,
                        scope_common::Point2D::new(bounds.min.x, bounds.max.y),
                    ]),
                };
                Ok(polygon.to_feature_with(Some(index as u64), &properties)?)
            })
            .collect::<Result<Vec<Feature>>>()?;

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_feature_collection()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AnnotationRecord;
    use outline::{BoundingBox, Polygon};
    use scope_common::Point2D;

    #[test]
    fn test_feature_collection() {
        let square = Polygon::new(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(0.0, 10.0),
        ]);
        let timeline: Timeline = vec![
            AnnotationRecord::new(1.0, 20_000.0, Shape::Polygon { polygon: square }),
            AnnotationRecord::new(0.0, 5.0, Shape::Polygon { polygon: Polygon::empty() }),
            AnnotationRecord::new(
                2.0,
                12.0,
                Shape::Box {
                    bounds: BoundingBox {
                        min: Point2D::new(1.0, 1.0),
                        max: Point2D::new(4.0, 5.0),
                    },
                },
            ),
        ]
        .into();

        let collection = timeline.to_feature_collection().unwrap();
        assert_eq!(collection.features.len(), 3);

        let first = &collection.features[0];
        assert!(first.geometry.is_none());
        assert_eq!(first.property("time").and_then(|v| v.as_f64()), Some(0.0));

        let second = &collection.features[1];
        assert!(second.geometry.is_some());
        assert_eq!(second.property("area_category").and_then(|v| v.as_str()), Some("M"));

        assert!(collection.features[2].geometry.is_some());
        assert!(timeline.to_geojson_string().unwrap().contains("FeatureCollection"));
    }
}
