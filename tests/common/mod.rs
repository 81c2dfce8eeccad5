#![allow(dead_code)]

use anyhow::Result;
use image::RgbImage;
use std::cell::Cell;
use traffic_density::detection::{BBox, Detection, Detector};

/// Detector that replays a fixed label list per call
pub struct ScriptedDetector {
    script: Vec<Vec<&'static str>>,
    calls: usize,
    size_queries: Cell<usize>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<&'static str>>) -> Self {
        Self {
            script,
            calls: 0,
            size_queries: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn size_queries(&self) -> usize {
        self.size_queries.get()
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
        let labels = self.script.get(self.calls).cloned().unwrap_or_default();
        self.calls += 1;

        Ok(labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let x = 2.0 + 6.0 * i as f32;
                Detection::new(
                    label,
                    0.8,
                    BBox {
                        x1: x,
                        y1: 2.0,
                        x2: x + 5.0,
                        y2: 7.0,
                    },
                )
            })
            .collect())
    }

    fn input_size(&self) -> (u32, u32) {
        self.size_queries.set(self.size_queries.get() + 1);
        (640, 640)
    }
}

/// Per-frame labels of the three-frame reference clip
pub fn three_frame_script() -> Vec<Vec<&'static str>> {
    vec![vec!["car", "person"], vec!["bus", "bus", "dog"], vec![]]
}

/// Detector that panics on its first call and then finds nothing
pub struct PanicOnceDetector {
    panicked: bool,
}

impl PanicOnceDetector {
    pub fn new() -> Self {
        Self { panicked: false }
    }
}

impl Detector for PanicOnceDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
        if !self.panicked {
            self.panicked = true;
            panic!("inference backend crashed");
        }
        Ok(Vec::new())
    }

    fn input_size(&self) -> (u32, u32) {
        (640, 640)
    }
}
