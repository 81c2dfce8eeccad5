use super::types::BBox;
use image::{imageops, Rgb, RgbImage};
use ndarray::Array4;

/// Gray level used to pad letterboxed frames
const PAD_VALUE: u8 = 114;

/// Mapping from model input space back to the original frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Letterbox {
    /// Map a corner-form box from model input coordinates to frame
    /// coordinates, clipped to the frame
    pub fn unmap(&self, x1: f32, y1: f32, x2: f32, y2: f32) -> BBox {
        let w = self.frame_width as f32;
        let h = self.frame_height as f32;

        BBox {
            x1: ((x1 - self.pad_x) / self.scale).clamp(0.0, w),
            y1: ((y1 - self.pad_y) / self.scale).clamp(0.0, h),
            x2: ((x2 - self.pad_x) / self.scale).clamp(0.0, w),
            y2: ((y2 - self.pad_y) / self.scale).clamp(0.0, h),
        }
    }
}

/// Preprocessor for converting RGB frames to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Compute the letterbox geometry for a frame of the given size
    pub fn letterbox(&self, frame_width: u32, frame_height: u32) -> Letterbox {
        let scale = (self.target_width as f32 / frame_width.max(1) as f32)
            .min(self.target_height as f32 / frame_height.max(1) as f32);
        let scaled_w = (frame_width as f32 * scale).round();
        let scaled_h = (frame_height as f32 * scale).round();

        Letterbox {
            scale,
            pad_x: ((self.target_width as f32 - scaled_w) / 2.0).floor(),
            pad_y: ((self.target_height as f32 - scaled_h) / 2.0).floor(),
            frame_width,
            frame_height,
        }
    }

    /// Preprocess an RGB frame into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Resize keeping the aspect ratio
    /// 2. Paste centered onto a gray canvas of the target size
    /// 3. Convert to float, normalize to [0, 1] and transpose HWC to NCHW
    ///
    /// Returns the tensor with shape [1, 3, height, width] and the
    /// letterbox needed to map boxes back.
    pub fn preprocess(&self, frame: &RgbImage) -> (Array4<f32>, Letterbox) {
        let _span = tracing::debug_span!("preprocess").entered();

        let (frame_width, frame_height) = frame.dimensions();
        let letterbox = self.letterbox(frame_width, frame_height);

        let scaled_w = ((frame_width as f32 * letterbox.scale).round() as u32)
            .clamp(1, self.target_width);
        let scaled_h = ((frame_height as f32 * letterbox.scale).round() as u32)
            .clamp(1, self.target_height);

        let resized = if (scaled_w, scaled_h) != (frame_width, frame_height) {
            imageops::resize(frame, scaled_w, scaled_h, imageops::FilterType::Triangle)
        } else {
            frame.clone()
        };

        let mut canvas = RgbImage::from_pixel(
            self.target_width,
            self.target_height,
            Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]),
        );
        imageops::overlay(
            &mut canvas,
            &resized,
            letterbox.pad_x as i64,
            letterbox.pad_y as i64,
        );

        let mut tensor = Array4::<f32>::zeros((
            1,
            3,
            self.target_height as usize,
            self.target_width as usize,
        ));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            tensor[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
        }

        (tensor, letterbox)
    }
}
