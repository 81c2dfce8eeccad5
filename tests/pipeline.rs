mod common;

use anyhow::Result;
use common::{three_frame_script, ScriptedDetector};
use image::RgbImage;
use traffic_density::detection::{Detection, Detector};
use traffic_density::source::{FrameSource, MemorySource};
use traffic_density::{run_pipeline, PipelineSettings};

#[test]
fn three_frame_clip_counts_vehicles_per_frame() {
    let mut source = MemorySource::blank(3, 32, 16);
    let mut detector = ScriptedDetector::new(three_frame_script());

    let report = run_pipeline(&mut source, &mut detector, PipelineSettings::default()).unwrap();

    assert_eq!(report.counts, vec![1, 2, 0]);
    assert_eq!(report.summary.frames_processed, 3);
    assert_eq!(report.summary.mean_vehicles, Some(1.0));
    assert_eq!(report.samples.len(), 1);
    assert_eq!(report.samples[0].index, 0);
    assert_eq!(report.samples[0].vehicle_count, 1);
    assert_eq!(report.samples[0].image.dimensions(), (32, 16));
    assert_eq!(detector.calls(), 3);
    assert_eq!(detector.size_queries(), 1);
}

#[test]
fn long_clip_samples_every_hundredth_frame() {
    let mut source = MemorySource::blank(350, 4, 4);
    let script = (0..350)
        .map(|i| if i % 2 == 0 { vec!["truck"] } else { vec!["person"] })
        .collect();
    let mut detector = ScriptedDetector::new(script);

    let report = run_pipeline(&mut source, &mut detector, PipelineSettings::default()).unwrap();

    assert_eq!(report.counts.len(), 350);
    let indices: Vec<u64> = report.samples.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 100, 200, 300]);
    assert_eq!(report.summary.mean_vehicles, Some(0.5));
}

#[test]
fn custom_interval_is_honoured() {
    let mut source = MemorySource::blank(7, 4, 4);
    let mut detector = ScriptedDetector::new(vec![]);
    let settings = PipelineSettings { sample_interval: 3 };

    let report = run_pipeline(&mut source, &mut detector, settings).unwrap();

    let indices: Vec<u64> = report.samples.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 3, 6]);
}

#[test]
fn empty_video_has_no_mean() {
    let mut source = MemorySource::new(vec![]);
    let mut detector = ScriptedDetector::new(three_frame_script());

    let report = run_pipeline(&mut source, &mut detector, PipelineSettings::default()).unwrap();

    assert!(report.counts.is_empty());
    assert!(report.samples.is_empty());
    assert_eq!(report.summary.frames_processed, 0);
    assert_eq!(report.summary.mean_vehicles, None);
    assert_eq!(detector.calls(), 0);
}

struct BrokenDetector;

impl Detector for BrokenDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
        anyhow::bail!("inference session crashed")
    }

    fn input_size(&self) -> (u32, u32) {
        (640, 640)
    }
}

#[test]
fn detector_failure_aborts_the_run() {
    let mut source = MemorySource::blank(2, 4, 4);

    let err = run_pipeline(&mut source, &mut BrokenDetector, PipelineSettings::default())
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("frame 0"));
    assert!(message.contains("inference session crashed"));
}

struct TruncatedSource {
    frames_left: u32,
}

impl FrameSource for TruncatedSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.frames_left == 0 {
            anyhow::bail!("invalid NAL unit");
        }
        self.frames_left -= 1;
        Ok(Some(RgbImage::new(4, 4)))
    }

    fn resolution(&self) -> (u32, u32) {
        (4, 4)
    }
}

#[test]
fn decode_failure_mid_stream_returns_no_partial_report() {
    let mut source = TruncatedSource { frames_left: 2 };
    let mut detector = ScriptedDetector::new(three_frame_script());

    let err = run_pipeline(&mut source, &mut detector, PipelineSettings::default()).unwrap_err();

    assert!(format!("{err:#}").contains("Failed to decode frame 2"));
    assert_eq!(detector.calls(), 2);
}
