use crate::{
    foundation::core::{AffineParams, BackendKind, FilterKind, FilterParams, Frame, Resolution},
    foundation::error::{VidfxError, VidfxResult},
    render::shaders::ShaderLoader,
};

/// Everything a backend needs to process one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSettings {
    pub filter: FilterKind,
    pub filter_params: FilterParams,
    pub affine_params: AffineParams,
    pub transform_enabled: bool,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            filter: FilterKind::None,
            filter_params: FilterParams::default(),
            affine_params: AffineParams::IDENTITY,
            transform_enabled: false,
        }
    }
}

impl FrameSettings {
    /// Clamp every parameter into range, logging a warning when anything changed.
    ///
    /// Call this once when settings are (re)built, not per frame.
    pub fn sanitized(&self) -> Self {
        let filter_params = self.filter_params.sanitized();
        let affine_params = self.affine_params.sanitized();
        if filter_params != self.filter_params {
            tracing::warn!(
                from = ?self.filter_params,
                to = ?filter_params,
                "filter parameters clamped"
            );
        }
        if affine_params != self.affine_params {
            tracing::warn!(
                from = ?self.affine_params,
                to = ?affine_params,
                "affine parameters clamped"
            );
        }
        Self {
            filter: self.filter,
            filter_params,
            affine_params,
            transform_enabled: self.transform_enabled,
        }
    }

    /// The affine parameters actually applied: identity when the transform is off.
    pub fn effective_affine(&self) -> AffineParams {
        if self.transform_enabled {
            self.affine_params.sanitized()
        } else {
            AffineParams::IDENTITY
        }
    }
}

/// One execution strategy for transform + filter.
///
/// `render` processes a frame up to the strategy's presentation point; `readback` returns the
/// last presented frame as packed BGR.
pub trait FrameBackend {
    fn kind(&self) -> BackendKind;

    /// (Re)allocate target resources for frames of `resolution`.
    fn resize(&mut self, resolution: Resolution) -> VidfxResult<()>;

    fn render(&mut self, frame: &Frame, settings: &FrameSettings) -> VidfxResult<()>;

    fn readback(&mut self) -> VidfxResult<Frame>;
}

pub fn create_backend(
    kind: BackendKind,
    _shaders: &dyn ShaderLoader,
) -> VidfxResult<Box<dyn FrameBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render::cpu::CpuBackend::new())),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu => Ok(Box::new(crate::render::gpu::GpuBackend::new(
            &_shaders.load()?,
        )?)),
        #[allow(unreachable_patterns)]
        _ => Err(VidfxError::validation(
            "gpu backend requested but vidfx was built without the `gpu` feature",
        )),
    }
}

/// Shared input check for [`FrameBackend::render`] implementations.
pub(crate) fn check_frame(frame: &Frame) -> VidfxResult<()> {
    if frame.is_empty() {
        return Err(VidfxError::frame("empty frame"));
    }
    if !frame.is_well_formed() {
        return Err(VidfxError::frame(format!(
            "{} frame carries {} bytes",
            frame.resolution(),
            frame.data.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
