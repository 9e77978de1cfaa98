//! vidfx compares two ways of applying per-pixel video filters and an affine transform:
//! direct pixel-buffer processing on the host ("CPU") and shader processing at draw time
//! ("GPU", behind the `gpu` feature).
//!
//! - [`affine_matrix`] builds the one transform both backends share
//! - [`FrameBackend`] implementations process frames ([`CpuBackend`], `GpuBackend`)
//! - [`BenchDriver`] sweeps a [`BenchConfig`] matrix and yields [`BenchResult`] rows
//! - [`LiveSession`] drives an interactive loop from [`ControlInput`]s
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod bench;
pub(crate) mod control;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod source;
pub(crate) mod transform;

pub use crate::foundation::core::{
    Affine, AffineParams, BackendKind, Bgr8, FilterKind, FilterParams, Frame, MIN_SCALE, Point,
    Resolution, Vec2, build_label,
};
pub use crate::foundation::error::{VidfxError, VidfxResult};

pub use crate::bench::config::{BenchConfig, BenchConfiguration, transform_label};
pub use crate::bench::driver::{BenchDriver, Clock, MonotonicClock, Phase, PhaseTracker, StopFlag};
pub use crate::bench::report::{
    BenchResult, CSV_HEADER, FRAME_LOG_HEADER, FrameLog, default_report_path, read_json_file,
    write_csv, write_csv_file, write_json_file,
};
pub use crate::bench::stats::{FpsAverager, FpsStats};
pub use crate::control::{CONTROLS_HELP, ControlInput, ControlState};
pub use crate::render::backend::{FrameBackend, FrameSettings, create_backend};
pub use crate::render::cpu::{CpuBackend, apply_affine, apply_filter};
#[cfg(feature = "gpu")]
pub use crate::render::gpu::{GpuBackend, GpuContext, ShaderBackend};
pub use crate::render::shaders::{BuiltinShaders, DirShaderLoader, ShaderLoader, ShaderSources};
pub use crate::session::{BackendFactory, LiveSession, TickReport};
pub use crate::source::{FrameSource, ImageSource, SyntheticSource};
pub use crate::transform::affine::{AffineMatrix, IDENTITY_TOLERANCE, affine_matrix};
