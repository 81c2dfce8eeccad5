use super::labels::class_name;
use super::preprocess::{Letterbox, Preprocessor};
use super::types::{Detection, Detector, DetectorParams};
use anyhow::{Context, Result};
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// YOLOv8 input size (square)
const INPUT_SIZE: u32 = 640;

/// Box coordinates preceding the class scores in each proposal
const BOX_CHANNELS: usize = 4;

/// YOLOv8 object detector exported to ONNX
///
/// Expects the standard ultralytics export: an `images` input of shape
/// [1, 3, 640, 640] and an `output0` output of shape [1, 4 + classes, proposals].
pub struct YoloDetector {
    session: Session,
    preprocessor: Preprocessor,
    params: DetectorParams,
}

impl YoloDetector {
    /// Create a new detector from an ONNX file
    pub fn new<P: AsRef<Path>>(model_path: P, params: DetectorParams) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading YOLO model from {}", path.display());

        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        #[cfg(feature = "gpu")]
        let builder = builder.with_execution_providers([
            ort::execution_providers::TensorRTExecutionProvider::default().build(),
            ort::execution_providers::CUDAExecutionProvider::default().build(),
        ])?;

        let session = builder
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("YOLO model loaded, input {}x{}", INPUT_SIZE, INPUT_SIZE);
        tracing::debug!(
            "conf_threshold={}, iou_threshold={}, max_detections={}",
            params.conf_threshold,
            params.iou_threshold,
            params.max_detections
        );

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(INPUT_SIZE, INPUT_SIZE),
            params,
        })
    }
}

impl Detector for YoloDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        let _span = tracing::debug_span!("yolo_detect").entered();

        let (input, letterbox) = self.preprocessor.preprocess(frame);
        let input = Tensor::from_array(input).context("Failed to create input tensor")?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs!["images" => input])
            .context("Failed to run inference")?;
        drop(_infer_span);

        let (shape, data) = outputs["output0"]
            .try_extract_tensor::<f32>()
            .context("Failed to extract output tensor")?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        if dims.len() != 3 || dims[1] as usize <= BOX_CHANNELS {
            anyhow::bail!("Unexpected YOLO output shape {:?}", dims);
        }
        let channels = dims[1] as usize;
        let proposals = dims[2] as usize;

        Ok(decode_output(data, channels, proposals, &letterbox, &self.params))
    }

    fn input_size(&self) -> (u32, u32) {
        (INPUT_SIZE, INPUT_SIZE)
    }
}

/// Decode a [4 + classes, proposals] output block into detections
///
/// Each column holds `cx, cy, w, h` in model input space followed by one
/// score per class.
pub fn decode_output(
    data: &[f32],
    channels: usize,
    proposals: usize,
    letterbox: &Letterbox,
    params: &DetectorParams,
) -> Vec<Detection> {
    let _span = tracing::debug_span!("postprocess").entered();

    let num_classes = channels.saturating_sub(BOX_CHANNELS);
    let value = |channel: usize, proposal: usize| data[channel * proposals + proposal];

    let mut candidates: Vec<(usize, Detection)> = Vec::new();
    for i in 0..proposals {
        let mut best_class = 0;
        let mut best_score = f32::MIN;
        for c in 0..num_classes {
            let score = value(BOX_CHANNELS + c, i);
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }

        if best_score < params.conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (value(0, i), value(1, i), value(2, i), value(3, i));
        let bbox = letterbox.unmap(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0);

        candidates.push((
            best_class,
            Detection::new(class_name(best_class), best_score, bbox),
        ));
    }

    let mut kept = nms(candidates, params.iou_threshold);
    kept.truncate(params.max_detections);
    kept
}

/// Class-aware greedy NMS, highest confidence first
fn nms(mut candidates: Vec<(usize, Detection)>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.1.confidence.total_cmp(&a.1.confidence));

    let mut suppressed = vec![false; candidates.len()];
    let mut kept = Vec::new();

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        let class = candidates[i].0;
        let detection = &candidates[i].1;
        for j in (i + 1)..candidates.len() {
            if !suppressed[j]
                && candidates[j].0 == class
                && detection.bbox.iou(&candidates[j].1.bbox) > iou_threshold
            {
                suppressed[j] = true;
            }
        }
        kept.push(detection.clone());
    }

    kept
}
