mod labels;
mod preprocess;
pub mod types;
mod yolo;

pub use labels::{class_name, COCO_CLASSES};
pub use preprocess::{Letterbox, Preprocessor};
pub use types::{BBox, Detection, Detector, DetectorParams};
pub use yolo::{decode_output, YoloDetector};

use anyhow::Result;

/// Create the default detector (YOLOv8)
pub fn create_default_detector(
    model_path: &str,
    params: DetectorParams,
) -> Result<Box<dyn Detector>> {
    let detector = YoloDetector::new(model_path, params)?;
    Ok(Box::new(detector))
}
