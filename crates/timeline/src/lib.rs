//! Per-frame measurements across a sampled video and their aggregation
//! into obstruction statistics.
//!
//! ```rust,no_run
//! use outline::ClassifierHandle;
//! use sampling::FfmpegSource;
//! use scope_common::CancelFlag;
//! use timeline::{FrameAnalysisPipeline, ScanConfig};
//!
//! # fn classifier() -> ClassifierHandle { ClassifierHandle::unavailable("example") }
//! let mut source = FfmpegSource::open("scope.mp4")?;
//! let pipeline = FrameAnalysisPipeline::new(classifier(), ScanConfig::default());
//! let outcome = pipeline.run(&mut source, &CancelFlag::new(), |p| {
//!     println!("{}/{}", p.processed, p.total);
//! })?;
//! println!("{}", pipeline.report(&outcome).to_json()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod snapshot;
pub mod stats;

pub use config::ScanConfig;
pub use error::{Result, TimelineError};
pub use pipeline::{FrameAnalysisPipeline, FrameMeasurement, ScanOutcome, ScanProgress, attach_snapshots};
pub use record::{AnnotationRecord, AreaCategory, Shape, Timeline, classify_area};
pub use report::{SeriesPoint, TimelineReport, edge_weight, smooth_areas};
pub use snapshot::{capture_snapshot, encode_data_url};
pub use stats::{AnalysisStats, compute_stats, severity_score};
