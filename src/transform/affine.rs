//! The single affine construction shared by the CPU and GPU backends.
//!
//! The matrix maps *source* pixel coordinates to *output* pixel coordinates (integer
//! coordinates at pixel centres). Both backends fill output pixel `p` by sampling the source
//! at `M^-1 * p`. Positive angles rotate counter-clockwise as seen on screen, where the y axis
//! points down.

use crate::foundation::core::{Affine, AffineParams, Vec2};

/// Coefficient tolerance under which a matrix counts as the identity.
pub const IDENTITY_TOLERANCE: f64 = 1e-6;

/// Row-major 3x3 affine matrix. The last row is always `[0, 0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineMatrix {
    pub rows: [[f64; 3]; 3],
}

impl AffineMatrix {
    pub const IDENTITY: Self = Self {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub fn from_affine(a: Affine) -> Self {
        let [a, b, c, d, e, f] = a.as_coeffs();
        Self {
            rows: [[a, c, e], [b, d, f], [0.0, 0.0, 1.0]],
        }
    }

    pub fn to_affine(&self) -> Affine {
        let r = &self.rows;
        Affine::new([r[0][0], r[1][0], r[0][1], r[1][1], r[0][2], r[1][2]])
    }

    pub fn is_identity(&self, tol: f64) -> bool {
        self.rows
            .iter()
            .flatten()
            .zip(Self::IDENTITY.rows.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= tol)
    }

    pub fn determinant(&self) -> f64 {
        self.rows[0][0] * self.rows[1][1] - self.rows[0][1] * self.rows[1][0]
    }

    /// `None` when the linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        Some(Self::from_affine(self.to_affine().inverse()))
    }

    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let r = &self.rows;
        (
            r[0][0] * x + r[0][1] * y + r[0][2],
            r[1][0] * x + r[1][1] * y + r[1][2],
        )
    }

    /// Column-major with each column padded to four floats (WGSL `mat3x3<f32>` layout).
    pub fn to_gpu_columns(&self) -> [[f32; 4]; 3] {
        let r = &self.rows;
        let mut cols = [[0.0f32; 4]; 3];
        for (c, col) in cols.iter_mut().enumerate() {
            for (row, v) in col.iter_mut().take(3).enumerate() {
                *v = r[row][c] as f32;
            }
        }
        cols
    }
}

/// Rotation and uniform scale about the image centre `(w/2, h/2)`, followed by the
/// translation `(translate_x, translate_y)`.
///
/// Parameters go through [`AffineParams::sanitized`] first, so a non-positive scale is
/// clamped rather than producing a singular matrix.
pub fn affine_matrix(params: &AffineParams, width: u32, height: u32) -> AffineMatrix {
    let p = params.sanitized();
    let center = Vec2::new(f64::from(width) * 0.5, f64::from(height) * 0.5);
    let about_center = Affine::translate(center)
        * Affine::rotate(-p.rotation_deg.to_radians())
        * Affine::scale(p.scale)
        * Affine::translate(-center);
    AffineMatrix::from_affine(about_center.then_translate(Vec2::new(p.translate_x, p.translate_y)))
}

#[cfg(test)]
#[path = "../../tests/unit/transform/affine.rs"]
mod tests;
