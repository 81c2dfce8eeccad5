use crate::counting::{is_vehicle, VEHICLE_LABELS};
use crate::detection::Detection;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Box outline thickness in pixels
const LINE_WIDTH: u32 = 2;

/// Outline color for every non-vehicle class
pub const OTHER_COLOR: Rgb<u8> = Rgb([148, 163, 184]);

/// Outline color for a detection label
pub fn label_color(label: &str) -> Rgb<u8> {
    match label {
        "car" => Rgb([37, 99, 235]),
        "bus" => Rgb([234, 179, 8]),
        "truck" => Rgb([220, 38, 38]),
        "motorcycle" => Rgb([22, 163, 74]),
        "bicycle" => Rgb([147, 51, 234]),
        _ => OTHER_COLOR,
    }
}

/// Draw detection boxes onto a copy of the frame
///
/// Vehicles are drawn after other classes so they stay on top.
pub fn annotate(frame: &RgbImage, detections: &[Detection]) -> RgbImage {
    let _span = tracing::debug_span!("annotate").entered();

    let mut canvas = frame.clone();
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return canvas;
    }

    let (vehicles, others): (Vec<&Detection>, Vec<&Detection>) = detections
        .iter()
        .partition(|d| is_vehicle(&d.label, &VEHICLE_LABELS));

    for detection in others.into_iter().chain(vehicles) {
        let color = label_color(&detection.label);
        let bbox = &detection.bbox;

        for inset in 0..LINE_WIDTH {
            let x = bbox.x1 as i32 + inset as i32;
            let y = bbox.y1 as i32 + inset as i32;
            let w = (bbox.width() as u32).saturating_sub(2 * inset);
            let h = (bbox.height() as u32).saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(w, h), color);
        }
    }

    canvas
}
