use std::{fmt, str::FromStr};

use crate::foundation::error::{VidfxError, VidfxResult};

pub use kurbo::{Affine, Point, Vec2};

/// One pixel in the frame's native channel order (blue, green, red).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Bgr8 {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Bgr8 {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    /// Red, green, blue scaled to `[0, 1]` (shader uniform order).
    pub fn to_unit_rgb(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

/// Frame size in pixels, written `{width}x{height}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = VidfxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| VidfxError::validation(format!("resolution '{s}' must be WxH")))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| VidfxError::validation(format!("bad resolution width in '{s}'")))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| VidfxError::validation(format!("bad resolution height in '{s}'")))?;
        if width == 0 || height == 0 {
            return Err(VidfxError::validation(format!(
                "resolution '{s}' must be non-zero"
            )));
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = VidfxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// A packed 3-channel (B, G, R) 8-bit frame, row-major, no row padding.
///
/// A 0x0 frame is the "empty" frame; filters and transforms leave it untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(width: u32, height: u32, data: Vec<u8>) -> VidfxResult<Self> {
        let expected = Self::byte_len(width, height)?;
        if data.len() != expected {
            return Err(VidfxError::frame(format!(
                "{width}x{height} frame needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn filled(width: u32, height: u32, color: Bgr8) -> Self {
        let n = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(n * Self::CHANNELS);
        for _ in 0..n {
            data.extend_from_slice(&[color.b, color.g, color.r]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn byte_len(width: u32, height: u32) -> VidfxResult<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(Self::CHANNELS))
            .ok_or_else(|| VidfxError::frame("frame size overflow"))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Data length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        Self::byte_len(self.width, self.height).is_ok_and(|n| n == self.data.len())
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * Self::CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> Bgr8 {
        let i = self.index(x, y);
        Bgr8::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, c: Bgr8) {
        let i = self.index(x, y);
        self.data[i..i + 3].copy_from_slice(&[c.b, c.g, c.r]);
    }

    /// Repack as RGBA8 with opaque alpha (GPU upload layout).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() / 3 * 4);
        for px in self.data.chunks_exact(3) {
            out.extend_from_slice(&[px[2], px[1], px[0], 255]);
        }
        out
    }

    /// Build from tightly packed RGBA8, dropping alpha.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> VidfxResult<Self> {
        let n = (width as usize) * (height as usize);
        if rgba.len() != n * 4 {
            return Err(VidfxError::frame(format!(
                "rgba buffer for {width}x{height} needs {} bytes, got {}",
                n * 4,
                rgba.len()
            )));
        }
        let mut data = Vec::with_capacity(n * 3);
        for px in rgba.chunks_exact(4) {
            data.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        Self::new(width, height, data)
    }

    pub fn from_rgb_image(img: &image::RgbImage) -> Self {
        let mut data = Vec::with_capacity(img.as_raw().len());
        for px in img.as_raw().chunks_exact(3) {
            data.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        Self {
            width: img.width(),
            height: img.height(),
            data,
        }
    }

    pub fn to_rgb_image(&self) -> VidfxResult<image::RgbImage> {
        let mut raw = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(3) {
            raw.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        image::RgbImage::from_raw(self.width, self.height, raw)
            .ok_or_else(|| VidfxError::frame("frame data does not match its dimensions"))
    }

    /// Largest absolute per-channel difference against a frame of the same size.
    pub fn max_channel_diff(&self, other: &Frame) -> VidfxResult<u8> {
        if self.width != other.width || self.height != other.height {
            return Err(VidfxError::frame(format!(
                "cannot compare {} with {}",
                self.resolution(),
                other.resolution()
            )));
        }
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap_or(0))
    }
}

/// Per-pixel filter selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    None,
    Pixelate,
    #[serde(alias = "keepcolor", alias = "keep-color")]
    KeepColor,
}

impl FilterKind {
    pub const ALL: [FilterKind; 3] = [FilterKind::None, FilterKind::Pixelate, FilterKind::KeepColor];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::None => "None",
            FilterKind::Pixelate => "Pixelate",
            FilterKind::KeepColor => "KeepColor",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = VidfxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(FilterKind::None),
            "pixelate" => Ok(FilterKind::Pixelate),
            "keepcolor" | "keep_color" | "keep-color" => Ok(FilterKind::KeepColor),
            other => Err(VidfxError::validation(format!("unknown filter '{other}'"))),
        }
    }
}

/// Which execution strategy processes a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Pixel-buffer processing on the host.
    Cpu,
    /// Shader processing at draw time.
    Gpu,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Cpu => "CPU",
            BackendKind::Gpu => "GPU",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BackendKind::Cpu => BackendKind::Gpu,
            BackendKind::Gpu => BackendKind::Cpu,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = VidfxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(BackendKind::Cpu),
            "gpu" => Ok(BackendKind::Gpu),
            other => Err(VidfxError::validation(format!("unknown backend '{other}'"))),
        }
    }
}

/// Filter knobs.
///
/// Out-of-range values are clamped to the nearest valid value by [`FilterParams::sanitized`]
/// instead of being rejected, so a live session or a running sweep never aborts on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Pixelate block edge in pixels. Values <= 1 disable pixelation.
    pub block_size: i32,
    /// KeepColor reference colour.
    pub keep_color: Bgr8,
    /// KeepColor distance threshold in `[0, 255]`.
    pub threshold: i32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            block_size: 8,
            keep_color: Bgr8::new(20, 20, 200),
            threshold: 60,
        }
    }
}

impl FilterParams {
    pub fn sanitized(self) -> Self {
        Self {
            block_size: self.block_size.max(1),
            keep_color: self.keep_color,
            threshold: self.threshold.clamp(0, 255),
        }
    }

    /// Block size as used by both backends; 1 means "no pixelation".
    pub fn effective_block(&self) -> u32 {
        self.block_size.max(1) as u32
    }
}

/// Translate / rotate / uniformly scale parameters, in pixels and degrees.
///
/// [`AffineParams::sanitized`] raises every scale below [`MIN_SCALE`] to it, positive ones
/// included; non-positive or non-finite scales become [`MIN_SCALE`] too. Non-finite offsets
/// or angles become zero. It never fails.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AffineParams {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    pub rotation_deg: f64,
}

/// Floor for every scale reaching the affine builder, matching the live scale control.
/// Smaller scales leave the `f32` shader inverse badly conditioned.
pub const MIN_SCALE: f64 = 0.1;

impl Default for AffineParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineParams {
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        rotation_deg: 0.0,
    };

    pub fn sanitized(self) -> Self {
        fn finite_or_zero(v: f64) -> f64 {
            if v.is_finite() { v } else { 0.0 }
        }
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale.max(MIN_SCALE)
        } else {
            MIN_SCALE
        };
        Self {
            translate_x: finite_or_zero(self.translate_x),
            translate_y: finite_or_zero(self.translate_y),
            scale,
            rotation_deg: finite_or_zero(self.rotation_deg),
        }
    }
}

/// `Debug` or `Release`, matching how the crate was compiled.
pub fn build_label() -> &'static str {
    if cfg!(debug_assertions) {
        "Debug"
    } else {
        "Release"
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
