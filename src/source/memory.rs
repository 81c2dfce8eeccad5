use super::FrameSource;
use anyhow::Result;
use image::RgbImage;
use std::collections::VecDeque;

/// Frame source backed by images already held in memory
pub struct MemorySource {
    frames: VecDeque<RgbImage>,
    width: u32,
    height: u32,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        let (width, height) = frames.first().map(|f| f.dimensions()).unwrap_or((0, 0));

        Self {
            frames: frames.into(),
            width,
            height,
        }
    }

    /// Build a source of `count` blank frames of the given size
    pub fn blank(count: usize, width: u32, height: u32) -> Self {
        Self::new((0..count).map(|_| RgbImage::new(width, height)).collect())
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
