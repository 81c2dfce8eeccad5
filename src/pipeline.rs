use crate::annotate::annotate;
use crate::counting::{count_vehicles, VEHICLE_LABELS};
use crate::detection::Detector;
use crate::report::AnalysisReport;
use crate::sampling::{Sampler, SAMPLE_INTERVAL};
use crate::source::{FrameSource, Frames};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};

/// Frames between progress log lines
const LOG_EVERY: u64 = 30;

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Keep every Nth frame for display
    pub sample_interval: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sample_interval: SAMPLE_INTERVAL,
        }
    }
}

/// Run detection over every frame of `source` and collect the results
///
/// Frames are processed strictly in order on the calling thread. A decode or
/// detection failure aborts the run; no partial report is returned.
pub fn run_pipeline<S, D>(
    source: &mut S,
    detector: &mut D,
    settings: PipelineSettings,
) -> Result<AnalysisReport>
where
    S: FrameSource + ?Sized,
    D: Detector + ?Sized,
{
    let (width, height) = source.resolution();
    let (input_width, input_height) = detector.input_size();
    tracing::info!(
        "Processing video frames at {}x{} (detector input {}x{}), sampling every {} frames",
        width,
        height,
        input_width,
        input_height,
        settings.sample_interval
    );

    let started = Instant::now();
    let mut counts: Vec<u32> = Vec::new();
    let mut sampler = Sampler::new(settings.sample_interval);
    let mut total_decode_time = Duration::ZERO;
    let mut total_detect_time = Duration::ZERO;

    let mut frames = Frames::new(source);
    loop {
        let decode_start = Instant::now();
        let Some(frame) = frames.next() else {
            break;
        };
        let frame = frame.with_context(|| format!("Failed to decode frame {}", counts.len()))?;
        total_decode_time += decode_start.elapsed();

        let detect_start = Instant::now();
        let detections = detector
            .detect(&frame.image)
            .with_context(|| format!("Failed to detect objects in frame {}", frame.index))?;
        total_detect_time += detect_start.elapsed();

        let vehicle_count = count_vehicles(&detections, &VEHICLE_LABELS);
        counts.push(vehicle_count);

        if sampler.offer(frame.index, vehicle_count, || annotate(&frame.image, &detections)) {
            tracing::debug!("Sampled frame {} with {} vehicles", frame.index, vehicle_count);
        }

        let processed = counts.len() as u64;
        if processed % LOG_EVERY == 0 {
            let avg_decode_ms = total_decode_time.as_secs_f64() * 1000.0 / processed as f64;
            let avg_detect_ms = total_detect_time.as_secs_f64() * 1000.0 / processed as f64;
            tracing::info!(
                "Frame {}: decode={:.1}ms, detect={:.1}ms, vehicles={}",
                processed,
                avg_decode_ms,
                avg_detect_ms,
                vehicle_count
            );
        }
    }

    let report = AnalysisReport::new(counts, sampler.into_records());

    match report.summary.mean_vehicles {
        Some(mean) => tracing::info!(
            "Processed {} frames in {:.1}s, average vehicles per frame {:.2}, {} samples",
            report.summary.frames_processed,
            started.elapsed().as_secs_f64(),
            mean,
            report.samples.len()
        ),
        None => tracing::warn!("Video contained no decodable frames"),
    }

    Ok(report)
}
