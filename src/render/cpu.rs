//! Pixel-buffer implementation of the transform and the filters.

use crate::{
    foundation::core::{AffineParams, BackendKind, Bgr8, FilterKind, FilterParams, Frame, Resolution},
    foundation::error::VidfxResult,
    foundation::math::{div_round, luma, round_u8},
    render::backend::{FrameBackend, FrameSettings, check_frame},
    transform::affine::{AffineMatrix, IDENTITY_TOLERANCE, affine_matrix},
};

/// Warp `frame` in place through the affine built from `params`.
///
/// Output pixel `p` is the bilinear sample of the source at `M^-1 * p`; taps outside the
/// source read as black. Identity matrices and empty frames are left untouched.
pub fn apply_affine(frame: &mut Frame, params: &AffineParams) {
    if frame.is_empty() || !frame.is_well_formed() {
        return;
    }
    let m = affine_matrix(params, frame.width, frame.height);
    if m.is_identity(IDENTITY_TOLERANCE) {
        return;
    }
    let Some(inv) = m.inverse() else {
        tracing::warn!(?m, "singular affine matrix, frame left untouched");
        return;
    };
    frame.data = warp_bilinear(frame, &inv);
}

fn warp_bilinear(src: &Frame, inv: &AffineMatrix) -> Vec<u8> {
    let (w, h) = (src.width as usize, src.height as usize);
    let mut out = vec![0u8; src.data.len()];
    let tap = |x: i64, y: i64| -> [f32; 3] {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            return [0.0; 3];
        }
        let i = (y as usize * w + x as usize) * Frame::CHANNELS;
        [
            f32::from(src.data[i]),
            f32::from(src.data[i + 1]),
            f32::from(src.data[i + 2]),
        ]
    };

    for (y, row) in out.chunks_exact_mut(w * Frame::CHANNELS).enumerate() {
        for (x, px) in row.chunks_exact_mut(Frame::CHANNELS).enumerate() {
            let (sx, sy) = inv.transform_point(x as f64, y as f64);
            // All four taps miss the source; also rejects NaN and huge offsets.
            if !((-1.0..w as f64).contains(&sx) && (-1.0..h as f64).contains(&sy)) {
                continue;
            }
            let (bx, by) = (sx.floor(), sy.floor());
            let (fx, fy) = ((sx - bx) as f32, (sy - by) as f32);
            let (x0, y0) = (bx as i64, by as i64);
            let (p00, p10) = (tap(x0, y0), tap(x0 + 1, y0));
            let (p01, p11) = (tap(x0, y0 + 1), tap(x0 + 1, y0 + 1));
            for c in 0..Frame::CHANNELS {
                let top = p00[c] * (1.0 - fx) + p10[c] * fx;
                let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
                px[c] = round_u8(top * (1.0 - fy) + bottom * fy);
            }
        }
    }
    out
}

/// Apply `kind` to `frame` in place. Empty frames are left untouched.
pub fn apply_filter(frame: &mut Frame, kind: FilterKind, params: &FilterParams) {
    if frame.is_empty() || !frame.is_well_formed() {
        return;
    }
    let params = params.sanitized();
    match kind {
        FilterKind::None => {}
        FilterKind::Pixelate => pixelate(frame, params.effective_block()),
        FilterKind::KeepColor => keep_color(frame, params.keep_color, params.threshold as u32),
    }
}

/// Half-open `[start, end)` spans of the cells covering `len` pixels.
///
/// There are `max(1, len / block)` cells and pixel `i` falls in cell `i * cells / len`.
pub(crate) fn cell_spans(len: u32, block: u32) -> Vec<(usize, usize)> {
    let len = u64::from(len);
    let cells = (len / u64::from(block.max(1))).max(1);
    let edge = |i: u64| (i * len).div_ceil(cells) as usize;
    (0..cells).map(|i| (edge(i), edge(i + 1))).collect()
}

fn pixelate(frame: &mut Frame, block: u32) {
    if block <= 1 {
        return;
    }
    let stride = frame.width as usize * Frame::CHANNELS;
    let cols = cell_spans(frame.width, block);
    let rows = cell_spans(frame.height, block);

    for &(y0, y1) in &rows {
        for &(x0, x1) in &cols {
            let mut sum = [0u64; 3];
            for y in y0..y1 {
                let line = &frame.data[y * stride + x0 * 3..y * stride + x1 * 3];
                for px in line.chunks_exact(3) {
                    sum[0] += u64::from(px[0]);
                    sum[1] += u64::from(px[1]);
                    sum[2] += u64::from(px[2]);
                }
            }
            let n = ((x1 - x0) * (y1 - y0)) as u64;
            let mean = [div_round(sum[0], n), div_round(sum[1], n), div_round(sum[2], n)];
            for y in y0..y1 {
                let line = &mut frame.data[y * stride + x0 * 3..y * stride + x1 * 3];
                for px in line.chunks_exact_mut(3) {
                    px.copy_from_slice(&mean);
                }
            }
        }
    }
}

fn keep_color(frame: &mut Frame, key: Bgr8, threshold: u32) {
    let limit = threshold * threshold;
    let key = [key.b, key.g, key.r];
    for px in frame.data.chunks_exact_mut(3) {
        let dist: u32 = px
            .iter()
            .zip(key)
            .map(|(&a, b)| u32::from(a.abs_diff(b)).pow(2))
            .sum();
        if dist > limit {
            px.fill(luma(px[0], px[1], px[2]));
        }
    }
}

/// Host-side backend: transform then filter, with the processed buffer as the presented frame.
pub struct CpuBackend {
    resolution: Option<Resolution>,
    output: Frame,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            resolution: None,
            output: Frame::empty(),
        }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBackend for CpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn resize(&mut self, resolution: Resolution) -> VidfxResult<()> {
        if self.resolution != Some(resolution) {
            tracing::debug!(%resolution, "cpu target resized");
            self.output = Frame::filled(resolution.width, resolution.height, Bgr8::BLACK);
            self.resolution = Some(resolution);
        }
        Ok(())
    }

    fn render(&mut self, frame: &Frame, settings: &FrameSettings) -> VidfxResult<()> {
        check_frame(frame)?;
        self.output.clone_from(frame);
        if settings.transform_enabled {
            apply_affine(&mut self.output, &settings.affine_params);
        }
        apply_filter(&mut self.output, settings.filter, &settings.filter_params);
        Ok(())
    }

    fn readback(&mut self) -> VidfxResult<Frame> {
        Ok(self.output.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
