//! Traffic density analysis for uploaded videos.
//!
//! Frames are decoded in order, passed through an object detector, and the
//! vehicles in each frame are counted. Every Nth frame is kept with its
//! boxes drawn, and the run ends with an HTML report of the mean count,
//! the sampled frames and a density chart.

pub mod annotate;
pub mod counting;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod sampling;
pub mod server;
pub mod source;

pub use error::AnalyzeError;
pub use pipeline::{run_pipeline, PipelineSettings};
pub use report::{AnalysisReport, Summary};
