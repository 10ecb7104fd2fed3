use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{error::Result, types::Polygon};

/// Properties attached to an exported outline
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[schemars(description = "Properties for region outline features")]
pub struct OutlineProperties {
    #[schemars(description = "Area enclosed by the polygon in square pixels")]
    pub area: f64,
    #[schemars(description = "Number of polygon vertices")]
    pub vertex_count: usize,
}

impl Polygon {
    /// GeoJSON polygon with the ring explicitly closed. `None` when there
    /// are fewer than three vertices.
    pub fn to_geometry(&self) -> Option<Geometry> {
        if self.points.len() < 3 {
            return None;
        }
        let mut ring: Vec<Vec<f64>> = self.points.iter().map(|p| vec![p.x, p.y]).collect();
        ring.push(ring[0].clone());
        Some(Geometry::new(Value::Polygon(vec![ring])))
    }

    /// Feature carrying any serializable properties object
    pub fn to_feature_with<P: Serialize>(&self, id: Option<u64>, properties: &P) -> Result<Feature> {
        let properties: Option<JsonObject> = serde_json::to_value(properties)?.as_object().cloned();
        Ok(Feature {
            bbox: None,
            geometry: self.to_geometry(),
            id: id.map(|id| geojson::feature::Id::Number(id.into())),
            properties,
            foreign_members: None,
        })
    }

    pub fn to_feature(&self) -> Result<Feature> {
        self.to_feature_with(
            None,
            &OutlineProperties {
                area: self.area(),
                vertex_count: self.len(),
            },
        )
    }

    /// Single-feature collection, pretty-printed
    pub fn to_geojson_string(&self) -> Result<String> {
        let collection = FeatureCollection {
            bbox: None,
            features: vec![self.to_feature()?],
            foreign_members: None,
        };
        Ok(serde_json::to_string_pretty(&collection)?)
    }
}
