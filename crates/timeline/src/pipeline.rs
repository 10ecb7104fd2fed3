use outline::{ClassifierHandle, OutlineError, Polygon, Segmenter};
use sampling::{VideoFrameSampler, VideoSource};
use scope_common::{CancelFlag, TimestampRange};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::error::Result;
use crate::record::{AnnotationRecord, Timeline};
use crate::report::TimelineReport;
use crate::snapshot::capture_snapshot;

/// Reported after every sampled timestamp, measured or skipped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanProgress {
    /// Timestamps handled so far
    pub processed: usize,
    /// Timestamps planned for the scan
    pub total: usize,
    pub time: f64,
}

impl ScanProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Whole-frame result for one sampled timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMeasurement {
    pub timestamp: f64,
    pub area: f64,
    pub polygon: Polygon,
}

/// What a scan produced. A cancelled scan still carries every frame
/// measured before the cancellation was seen.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub measurements: Vec<FrameMeasurement>,
    pub timeline: Timeline,
    /// Range that was sampled
    pub window: TimestampRange,
    /// Timestamps that could not be read or measured
    pub skipped: usize,
    pub cancelled: bool,
}

/// Drives the sampler and the whole-frame segmenter over a video
#[derive(Debug, Clone)]
pub struct FrameAnalysisPipeline {
    segmenter: Segmenter,
    config: ScanConfig,
}

impl FrameAnalysisPipeline {
    pub fn new(classifier: ClassifierHandle, config: ScanConfig) -> Self {
        Self {
            segmenter: Segmenter::new(classifier, config.segmentation.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Sample `source` and measure each frame in order. Frames that fail to
    /// decode or segment are logged and skipped. Only an unavailable
    /// classifier aborts the scan. `cancel` is checked before every seek.
    pub fn run<S, F>(&self, source: &mut S, cancel: &CancelFlag, mut on_progress: F) -> Result<ScanOutcome>
    where
        S: VideoSource + ?Sized,
        F: FnMut(&ScanProgress),
    {
        self.config.validate()?;
        if let outline::ClassifierStatus::Unavailable { reason } = self.segmenter.mask_segmenter().classifier().status() {
            return Err(OutlineError::ModelUnavailable(reason).into());
        }

        let window = self.config.window.resolve(source.metadata().duration);
        info!(
            source = %source.description(),
            start = window.start,
            end = window.end,
            rate = self.config.sample_rate,
            "starting scan"
        );

        let mut measurements = Vec::new();
        let mut timeline = Timeline::new();
        let mut skipped = 0;
        let mut cancelled = false;

        {
            let mut sampler = VideoFrameSampler::new(&mut *source, self.config.sample_rate)?
                .with_window(self.config.window)
                .with_retry(self.config.retry.clone());
            let total = sampler.remaining();
            let mut processed = 0;

            loop {
                if cancel.is_cancelled() {
                    info!(processed, total, "scan cancelled");
                    cancelled = true;
                    break;
                }
                let Some(item) = sampler.next() else {
                    break;
                };
                processed += 1;

                let time = match item {
                    Ok(frame) => {
                        let measured = self
                            .config
                            .retry
                            .run("classify", |_| self.segmenter.scan_whole_frame(&frame.image));
                        match measured {
                            Ok(measurement) => {
                                debug!(time = frame.timestamp, area = measurement.area, "frame measured");
                                timeline.insert(AnnotationRecord::from_measurement(frame.timestamp, measurement.clone()));
                                measurements.push(FrameMeasurement {
                                    timestamp: frame.timestamp,
                                    area: measurement.area,
                                    polygon: measurement.polygon,
                                });
                            }
                            Err(error @ OutlineError::ModelUnavailable(_)) => return Err(error.into()),
                            Err(error) => {
                                warn!(time = frame.timestamp, %error, "skipping frame");
                                skipped += 1;
                            }
                        }
                        frame.timestamp
                    }
                    Err(error) => {
                        // Already logged by the sampler
                        debug!(%error, "frame unavailable");
                        skipped += 1;
                        error.time().unwrap_or(f64::NAN)
                    }
                };

                on_progress(&ScanProgress { processed, total, time });
            }
        }

        if self.config.capture_snapshots && !cancelled {
            let report = TimelineReport::build(&timeline, window, self.config.smoothing_window);
            attach_snapshots(source, &mut timeline, &report);
        }

        info!(
            measured = measurements.len(),
            skipped,
            cancelled,
            "scan finished"
        );

        Ok(ScanOutcome {
            measurements,
            timeline,
            window,
            skipped,
            cancelled,
        })
    }

    pub fn report(&self, outcome: &ScanOutcome) -> TimelineReport {
        TimelineReport::build(&outcome.timeline, outcome.window, self.config.smoothing_window)
    }
}

/// Embed the frames of the smallest and largest records, and of the
/// report's worst and weighted peak points. Failures are logged and leave
/// the record without an image.
pub fn attach_snapshots<S: VideoSource + ?Sized>(source: &mut S, timeline: &mut Timeline, report: &TimelineReport) {
    let stats = &report.stats;
    let times: Vec<f64> = [
        stats.smallest.as_ref().map(|r| r.time),
        stats.largest.as_ref().map(|r| r.time),
        report.worst.as_ref().map(|p| p.time),
        report.weighted_peak.as_ref().map(|p| p.time),
    ]
    .into_iter()
    .flatten()
    .collect();

    for time in times {
        if timeline.get(time).is_some_and(|r| r.source_image.is_some()) {
            continue;
        }
        match capture_snapshot(source, time) {
            Ok(url) => {
                if let Some(record) = timeline.get_mut(time) {
                    record.source_image = Some(url);
                }
            }
            Err(error) => warn!(time, %error, "could not capture snapshot"),
        }
    }
}
