mod chart;
mod html;

pub use chart::render_density_chart;
pub use html::{render_error_page, render_report_page, render_upload_page};

use crate::sampling::SampleRecord;

/// Totals derived once all frames are processed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub frames_processed: usize,
    /// `None` when no frames were decoded
    pub mean_vehicles: Option<f64>,
}

impl Summary {
    pub fn from_counts(counts: &[u32]) -> Self {
        Self {
            frames_processed: counts.len(),
            mean_vehicles: mean(counts),
        }
    }
}

/// Arithmetic mean of the per-frame counts
pub fn mean(counts: &[u32]) -> Option<f64> {
    if counts.is_empty() {
        return None;
    }
    let total: u64 = counts.iter().map(|&c| c as u64).sum();
    Some(total as f64 / counts.len() as f64)
}

/// Everything a finished analysis produced
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Vehicle count for every decoded frame, in capture order
    pub counts: Vec<u32>,
    pub samples: Vec<SampleRecord>,
    pub summary: Summary,
}

impl AnalysisReport {
    pub fn new(counts: Vec<u32>, samples: Vec<SampleRecord>) -> Self {
        let summary = Summary::from_counts(&counts);
        Self {
            counts,
            samples,
            summary,
        }
    }
}
