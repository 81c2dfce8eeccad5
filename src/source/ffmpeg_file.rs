use super::FrameSource;
use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;
use ffmpeg_next::util::error::EAGAIN;
use image::RgbImage;
use std::path::Path;

/// Video file decoder backed by FFmpeg
///
/// Decodes the best video stream of the container and converts every
/// frame to packed RGB24.
pub struct FfmpegVideoSource {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    decoded: ffmpeg::frame::Video,
    rgb: ffmpeg::frame::Video,
    width: u32,
    height: u32,
    eof_sent: bool,
    drained: bool,
}

impl FfmpegVideoSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening video {}", path.display());

        ffmpeg::init().context("Failed to initialize ffmpeg")?;

        let input = ffmpeg::format::input(path)
            .with_context(|| format!("Failed to open video container {}", path.display()))?;
        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .context("Video container has no video stream")?;
        let stream_index = stream.index();

        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .context("Failed to load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("Failed to open video decoder")?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .context("Failed to create RGB scaler")?;

        tracing::info!("Video stream {} opened at {}x{}", stream_index, width, height);

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            decoded: ffmpeg::frame::Video::empty(),
            rgb: ffmpeg::frame::Video::empty(),
            width,
            height,
            eof_sent: false,
            drained: false,
        })
    }

    fn convert_decoded(&mut self) -> Result<RgbImage> {
        self.scaler
            .run(&self.decoded, &mut self.rgb)
            .context("Failed to convert frame to RGB")?;

        frame_to_image(&self.rgb)
    }
}

impl FrameSource for FfmpegVideoSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.drained {
            return Ok(None);
        }

        loop {
            match self.decoder.receive_frame(&mut self.decoded) {
                Ok(()) => return self.convert_decoded().map(Some),
                Err(ffmpeg::Error::Eof) => {
                    self.drained = true;
                    return Ok(None);
                }
                Err(ffmpeg::Error::Other { errno }) if errno == EAGAIN => {}
                Err(err) => {
                    return Err(anyhow::Error::new(err).context("Failed to decode video frame"));
                }
            }

            if self.eof_sent {
                // Decoder flushed and nothing left to receive
                self.drained = true;
                return Ok(None);
            }

            let next_packet = self.input.packets().next();
            match next_packet {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    self.decoder
                        .send_packet(&packet)
                        .context("Failed to decode video packet")?;
                }
                None => {
                    self.decoder
                        .send_eof()
                        .context("Failed to flush video decoder")?;
                    self.eof_sent = true;
                }
            }
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Copy an RGB24 frame into an image, dropping any row padding
fn frame_to_image(frame: &ffmpeg::frame::Video) -> Result<RgbImage> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = width as usize * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    let pixels = if stride == row_bytes {
        data.get(..row_bytes * height as usize)
            .context("RGB frame is shorter than its dimensions")?
            .to_vec()
    } else {
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            pixels.extend_from_slice(
                data.get(start..start + row_bytes)
                    .context("RGB frame row is out of bounds")?,
            );
        }
        pixels
    };

    RgbImage::from_raw(width, height, pixels).context("RGB frame has inconsistent dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Write a yuv4mpeg clip of flat mid-gray 4:2:0 frames
    fn y4m_clip(width: u32, height: u32, frames: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("clip-")
            .suffix(".y4m")
            .tempfile()
            .unwrap();
        write!(file, "YUV4MPEG2 W{width} H{height} F25:1 Ip A1:1 C420jpeg\n").unwrap();

        let luma = (width * height) as usize;
        let chroma = ((width / 2) * (height / 2)) as usize;
        for _ in 0..frames {
            file.write_all(b"FRAME\n").unwrap();
            file.write_all(&vec![128u8; luma + 2 * chroma]).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn padded_rows_are_stripped() {
        ffmpeg::init().unwrap();
        let (width, height) = (5u32, 3u32);
        let mut frame = ffmpeg::frame::Video::new(ffmpeg::format::Pixel::RGB24, width, height);
        let stride = frame.stride(0);
        assert!(stride > width as usize * 3);

        let data = frame.data_mut(0);
        for y in 0..height as usize {
            for x in 0..width as usize {
                let offset = y * stride + x * 3;
                data[offset..offset + 3].copy_from_slice(&[x as u8, y as u8, 200]);
            }
            // Padding bytes must not leak into the image
            for byte in &mut data[y * stride + width as usize * 3..(y + 1) * stride] {
                *byte = 0xEE;
            }
        }

        let image = frame_to_image(&frame).unwrap();
        assert_eq!(image.dimensions(), (width, height));
        for (x, y, pixel) in image.enumerate_pixels() {
            assert_eq!(pixel.0, [x as u8, y as u8, 200]);
        }
    }

    #[test]
    fn garbage_container_fails_to_open() {
        let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        file.write_all(&[0x5Au8; 4096]).unwrap();
        file.flush().unwrap();

        assert!(FfmpegVideoSource::open(file.path()).is_err());
    }

    #[test]
    fn missing_file_fails_to_open() {
        assert!(FfmpegVideoSource::open("/nonexistent/traffic.mp4").is_err());
    }

    #[test]
    fn decodes_every_frame_then_stays_exhausted() {
        let clip = y4m_clip(16, 8, 4);
        let mut source = FfmpegVideoSource::open(clip.path()).unwrap();
        assert_eq!(source.resolution(), (16, 8));

        for _ in 0..4 {
            let frame = source.next_frame().unwrap().expect("frame before end of stream");
            assert_eq!(frame.dimensions(), (16, 8));
        }
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }
}
