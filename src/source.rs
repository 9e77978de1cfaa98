use std::path::Path;

use crate::foundation::{
    core::{Bgr8, Frame, Resolution},
    error::{VidfxError, VidfxResult},
    math::mix64,
};

/// Supplies raw frames on demand. `None` means no frame is available this tick.
pub trait FrameSource {
    fn next_frame(&mut self, resolution: Resolution) -> Option<Frame>;
}

/// Deterministic benchmark frames: per-tick noise with a moving filled disc.
#[derive(Clone, Debug)]
pub struct SyntheticSource {
    seed: u64,
    tick: u64,
}

impl SyntheticSource {
    pub const DISC_COLOR: Bgr8 = Bgr8::new(20, 20, 220);

    pub fn new(seed: u64) -> Self {
        Self { seed, tick: 0 }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The frame for tick `tick`, independent of the source's own counter.
    pub fn frame_at(&self, resolution: Resolution, tick: u64) -> Frame {
        let Resolution { width, height } = resolution;
        let mut data = Vec::with_capacity(resolution.pixel_count() * Frame::CHANNELS);
        let base = self.seed ^ tick.rotate_left(40);
        for i in 0..resolution.pixel_count() as u64 {
            let n = mix64(base ^ i).to_le_bytes();
            data.extend_from_slice(&n[..3]);
        }
        let mut frame = Frame {
            width,
            height,
            data,
        };

        let (w, h) = (u64::from(width), u64::from(height));
        let cx = (tick * 37 % w) as i64;
        let cy = (tick * 53 % h) as i64;
        let radius = i64::from((width.min(height) / 12).max(8));
        fill_disc(&mut frame, cx, cy, radius, Self::DISC_COLOR);
        frame
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(0x5eed)
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self, resolution: Resolution) -> Option<Frame> {
        self.tick += 1;
        Some(self.frame_at(resolution, self.tick))
    }
}

fn fill_disc(frame: &mut Frame, cx: i64, cy: i64, radius: i64, color: Bgr8) {
    let (w, h) = (i64::from(frame.width), i64::from(frame.height));
    for y in (cy - radius).max(0)..(cy + radius + 1).min(h) {
        for x in (cx - radius).max(0)..(cx + radius + 1).min(w) {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= radius * radius {
                frame.set_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// A still image replayed every tick, resized to whatever resolution is requested.
pub struct ImageSource {
    image: image::RgbImage,
    cached: Option<Frame>,
}

impl ImageSource {
    pub fn open(path: &Path) -> VidfxResult<Self> {
        let image = image::open(path)
            .map_err(|e| VidfxError::validation(format!("open image {}: {e}", path.display())))?
            .to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(VidfxError::validation(format!(
                "image {} has no pixels",
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), width = image.width(), height = image.height(), "image source opened");
        Ok(Self::from_image(image))
    }

    pub fn from_image(image: image::RgbImage) -> Self {
        Self {
            image,
            cached: None,
        }
    }

    pub fn native_resolution(&self) -> Resolution {
        Resolution::new(self.image.width(), self.image.height())
    }
}

impl FrameSource for ImageSource {
    fn next_frame(&mut self, resolution: Resolution) -> Option<Frame> {
        if resolution.width == 0 || resolution.height == 0 {
            return None;
        }
        match &self.cached {
            Some(f) if f.resolution() == resolution => {}
            _ => {
                let frame = if resolution == self.native_resolution() {
                    Frame::from_rgb_image(&self.image)
                } else {
                    Frame::from_rgb_image(&image::imageops::resize(
                        &self.image,
                        resolution.width,
                        resolution.height,
                        image::imageops::FilterType::Triangle,
                    ))
                };
                self.cached = Some(frame);
            }
        }
        self.cached.clone()
    }
}

#[cfg(test)]
#[path = "../tests/unit/source/source.rs"]
mod tests;
