#[cfg(feature = "ffmpeg")]
mod ffmpeg_file;
mod memory;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg_file::FfmpegVideoSource;
pub use memory::MemorySource;

use anyhow::Result;
use image::RgbImage;
use std::path::Path;

/// Trait for forward-only video frame sources
pub trait FrameSource {
    /// Decode the next frame in capture order
    ///
    /// Returns `Ok(None)` once the stream is exhausted. Every call after
    /// that also returns `Ok(None)`.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of decoded frames
    fn resolution(&self) -> (u32, u32);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).next_frame()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }
}

/// A decoded frame and its 0-based position in the stream
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
}

/// Iterator over a source that numbers frames as they are decoded.
///
/// Fuses after the first error or end of stream.
pub struct Frames<'a, S: ?Sized> {
    source: &'a mut S,
    next_index: u64,
    finished: bool,
}

impl<'a, S: FrameSource + ?Sized> Frames<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self {
            source,
            next_index: 0,
            finished: false,
        }
    }
}

impl<S: FrameSource + ?Sized> Iterator for Frames<'_, S> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.source.next_frame() {
            Ok(Some(image)) => {
                let index = self.next_index;
                self.next_index += 1;
                Some(Ok(Frame { index, image }))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Whether `open_video` can decode real files in this build
pub const DECODER_AVAILABLE: bool = cfg!(feature = "ffmpeg");

/// Open a video file for decoding
#[cfg(feature = "ffmpeg")]
pub fn open_video<P: AsRef<Path>>(path: P) -> Result<Box<dyn FrameSource>> {
    let source = FfmpegVideoSource::open(path)?;
    Ok(Box::new(source))
}

/// Open a video file for decoding
#[cfg(not(feature = "ffmpeg"))]
pub fn open_video<P: AsRef<Path>>(path: P) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "cannot decode {}: built without the `ffmpeg` feature",
        path.as_ref().display()
    )
}
