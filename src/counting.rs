use crate::detection::Detection;

/// Class labels counted as vehicles
pub const VEHICLE_LABELS: [&str; 5] = ["car", "bus", "truck", "motorcycle", "bicycle"];

pub fn is_vehicle(label: &str, vehicle_labels: &[&str]) -> bool {
    vehicle_labels.contains(&label)
}

/// Count the detections whose label is in `vehicle_labels`
pub fn count_vehicles(detections: &[Detection], vehicle_labels: &[&str]) -> u32 {
    detections
        .iter()
        .filter(|d| is_vehicle(&d.label, vehicle_labels))
        .count() as u32
}
