use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;
use crate::record::{AnnotationRecord, Timeline};

/// Obstruction above this is severe
pub const SEVERE_OBSTRUCTION: f64 = 75.0;
/// Obstruction at or above this is moderate
pub const MODERATE_OBSTRUCTION: f64 = 50.0;

/// Min/max reduction over a set of records. With fewer than two valid
/// records the stats are degenerate: `error` is set, the obstruction is 0
/// and `smallest`/`largest` hold the single valid record, if there is one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisStats {
    pub smallest: Option<AnnotationRecord>,
    pub largest: Option<AnnotationRecord>,
    /// Percentage in `[0, 100]`
    pub obstruction_percent: f64,
    /// 0, 1 or 2
    pub severity_score: u8,
    /// Number of records with a positive area
    pub valid_records: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisStats {
    fn degenerate(representative: Option<AnnotationRecord>, valid_records: usize) -> Self {
        Self {
            smallest: representative.clone(),
            largest: representative,
            obstruction_percent: 0.0,
            severity_score: 0,
            valid_records,
            error: Some(TimelineError::InputExhausted { valid: valid_records }.to_string()),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.error.is_some()
    }
}

pub fn severity_score(obstruction_percent: f64) -> u8 {
    if obstruction_percent > SEVERE_OBSTRUCTION {
        2
    } else if obstruction_percent >= MODERATE_OBSTRUCTION {
        1
    } else {
        0
    }
}

/// Reduce records to their smallest and largest area. Timestamps play no
/// part: this is not a time-series analysis.
pub fn compute_stats<'a, I>(records: I) -> AnalysisStats
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    let mut valid: Vec<&AnnotationRecord> = records.into_iter().filter(|r| r.is_valid()).collect();

    if valid.len() < 2 {
        let count = valid.len();
        return AnalysisStats::degenerate(valid.pop().cloned(), count);
    }

    valid.sort_by(|a, b| a.area.total_cmp(&b.area));
    let smallest = valid[0];
    let largest = valid[valid.len() - 1];

    let obstruction_percent = if largest.area > 0.0 {
        ((largest.area - smallest.area) / largest.area * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    AnalysisStats {
        smallest: Some(smallest.clone()),
        largest: Some(largest.clone()),
        obstruction_percent,
        severity_score: severity_score(obstruction_percent),
        valid_records: valid.len(),
        error: None,
    }
}

impl Timeline {
    /// Recomputed from the current records on every call
    pub fn stats(&self) -> AnalysisStats {
        compute_stats(self.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Shape;
    use outline::Polygon;

    fn record(time: f64, area: f64) -> AnnotationRecord {
        AnnotationRecord::new(time, area, Shape::Polygon { polygon: Polygon::empty() })
    }

    #[test]
    fn test_exactly_seventy_five_is_moderate() {
        let records = vec![record(0.0, 100_000.0), record(1.0, 25_000.0)];
        let stats = compute_stats(&records);
        assert_eq!(stats.obstruction_percent, 75.0);
        assert_eq!(stats.severity_score, 1);
        assert_eq!(stats.smallest.as_ref().map(|r| r.time), Some(1.0));
        assert_eq!(stats.largest.as_ref().map(|r| r.time), Some(0.0));
        assert!(!stats.is_degenerate());
    }

    #[test]
    fn test_just_above_seventy_five_is_severe() {
        let records = vec![record(0.0, 100_000.0), record(1.0, 24_990.0)];
        let stats = compute_stats(&records);
        assert!(stats.obstruction_percent > 75.0);
        assert_eq!(stats.severity_score, 2);
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(severity_score(75.01), 2);
        assert_eq!(severity_score(75.0), 1);
        assert_eq!(severity_score(50.0), 1);
        assert_eq!(severity_score(49.99), 0);
        assert_eq!(severity_score(0.0), 0);
    }

    #[test]
    fn test_empty_is_degenerate() {
        let stats = compute_stats(&Vec::<AnnotationRecord>::new());
        assert!(stats.is_degenerate());
        assert!(stats.smallest.is_none() && stats.largest.is_none());
        assert_eq!(stats.severity_score, 0);
    }

    #[test]
    fn test_single_record_is_degenerate() {
        let records = vec![record(3.0, 500.0)];
        let stats = compute_stats(&records);
        assert!(stats.is_degenerate());
        assert_eq!(stats.smallest.as_ref().map(|r| r.area), Some(500.0));
        assert_eq!(stats.valid_records, 1);
    }

    #[test]
    fn test_zero_areas_do_not_count() {
        let records = vec![record(0.0, 0.0), record(1.0, 400.0), record(2.0, 0.0)];
        let stats = compute_stats(&records);
        assert!(stats.is_degenerate());
        assert_eq!(stats.largest.map(|r| r.time), Some(1.0));
    }

    #[test]
    fn test_ignores_time_order() {
        let forward = vec![record(0.0, 10.0), record(1.0, 40.0), record(2.0, 20.0)];
        let backward: Vec<_> = forward.iter().rev().cloned().collect();
        assert_eq!(
            compute_stats(&forward).obstruction_percent,
            compute_stats(&backward).obstruction_percent
        );
        assert_eq!(compute_stats(&forward).obstruction_percent, 75.0);
    }

    #[test]
    fn test_timeline_stats_track_changes() {
        let mut timeline: Timeline = vec![record(0.0, 100.0), record(1.0, 50.0)].into();
        assert_eq!(timeline.stats().obstruction_percent, 50.0);
        timeline.insert(record(1.0, 90.0));
        assert!((timeline.stats().obstruction_percent - 10.0).abs() < 1e-9);
    }
}
