use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use scope_common::{TimestampRange, utils::round_to};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::Timeline;
use crate::stats::AnalysisStats;

/// Share of the window at each end where the weight ramps
const EDGE_RAMP: f64 = 0.15;

/// Centred rolling mean. Positions whose full window does not fit inside
/// the series keep their raw value.
pub fn smooth_areas(areas: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return areas.to_vec();
    }
    let left = window / 2;
    let right = window - 1 - left;

    (0..areas.len())
        .map(|i| {
            if i >= left && i + right < areas.len() {
                areas[i - left..=i + right].iter().sum::<f64>() / window as f64
            } else {
                areas[i]
            }
        })
        .collect()
}

/// Trapezoid weight over `[start, end]`: ramps up over the first 15%, flat,
/// ramps down over the last 15%. An empty window weighs everything 1.
pub fn edge_weight(time: f64, start: f64, end: f64) -> f64 {
    let total = end - start;
    if total <= 0.0 {
        return 1.0;
    }
    let position = (time - start) / total;
    let weight = if position < EDGE_RAMP {
        position / EDGE_RAMP
    } else if position > 1.0 - EDGE_RAMP {
        (1.0 - position) / EDGE_RAMP
    } else {
        1.0
    };
    weight.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesPoint {
    pub time: f64,
    pub area: f64,
    pub smoothed_area: f64,
    /// Shrinkage relative to the largest smoothed area, 2 decimals
    pub obstruction_percent: f64,
    /// JPEG data URL of the frame, when one was captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
}

/// Everything a consumer needs to chart a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineReport {
    pub generated_at: DateTime<Utc>,
    pub stats: AnalysisStats,
    pub series: Vec<SeriesPoint>,
    /// Point with the smallest smoothed area
    pub worst: Option<SeriesPoint>,
    /// Point with the largest smoothed area once the window edges are
    /// discounted
    pub weighted_peak: Option<SeriesPoint>,
}

impl TimelineReport {
    pub fn build(timeline: &Timeline, window: TimestampRange, smoothing_window: usize) -> Self {
        let areas: Vec<f64> = timeline.records().map(|r| r.area).collect();
        let smoothed = smooth_areas(&areas, smoothing_window);

        let reference = smoothed.iter().copied().fold(0.0_f64, f64::max);
        let series: Vec<SeriesPoint> = timeline
            .records()
            .zip(&smoothed)
            .map(|(record, &smoothed_area)| {
                let obstruction = if reference > 0.0 {
                    ((reference - smoothed_area) / reference * 100.0).clamp(0.0, 100.0)
                } else {
                    0.0
                };
                SeriesPoint {
                    time: record.time,
                    area: record.area,
                    smoothed_area,
                    obstruction_percent: round_to(obstruction, 2),
                    source_image: record.source_image.clone(),
                }
            })
            .collect();

        // First of equal minima wins
        let worst = series
            .iter()
            .fold(None::<&SeriesPoint>, |low, point| match low {
                Some(low) if low.smoothed_area <= point.smoothed_area => Some(low),
                _ => Some(point),
            })
            .cloned();

        let weighted_peak = series
            .iter()
            .map(|p| (p, p.smoothed_area * edge_weight(p.time, window.start, window.end)))
            .fold(None::<(&SeriesPoint, f64)>, |best, (point, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((point, score)),
            })
            .map(|(point, _)| point.clone());

        Self {
            generated_at: Utc::now(),
            stats: timeline.stats(),
            series,
            worst,
            weighted_peak,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
