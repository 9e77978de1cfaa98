use std::{fmt, path::Path, time::Duration};

use crate::{
    foundation::core::{AffineParams, BackendKind, FilterKind, FilterParams, Resolution},
    foundation::error::{VidfxError, VidfxResult},
    render::backend::FrameSettings,
};

/// The sweep to run. Loadable from JSON; every field is optional and falls back to the
/// defaults of the reference benchmark.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    pub backends: Vec<BackendKind>,
    pub filters: Vec<FilterKind>,
    pub transforms: Vec<bool>,
    pub resolutions: Vec<Resolution>,
    pub warmup_secs: f64,
    pub sample_secs: f64,
    /// Consecutive ticks without a usable frame before a configuration is recorded as is.
    pub max_idle_ticks: u32,
    pub filter_params: FilterParams,
    pub affine_params: AffineParams,
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        let mut backends = vec![BackendKind::Cpu];
        if cfg!(feature = "gpu") {
            backends.push(BackendKind::Gpu);
        }
        Self {
            backends,
            filters: FilterKind::ALL.to_vec(),
            transforms: vec![false, true],
            resolutions: vec![
                Resolution::new(640, 480),
                Resolution::new(1280, 720),
                Resolution::new(1920, 1080),
            ],
            warmup_secs: 1.0,
            sample_secs: 5.0,
            max_idle_ticks: 1000,
            filter_params: FilterParams::default(),
            affine_params: AffineParams {
                translate_x: 60.0,
                translate_y: 40.0,
                scale: 1.15,
                rotation_deg: 8.0,
            },
            seed: 0x5eed,
        }
    }
}

/// One cell of the sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BenchConfiguration {
    pub backend: BackendKind,
    pub filter: FilterKind,
    pub transform: bool,
    pub resolution: Resolution,
}

impl fmt::Display for BenchConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.backend,
            self.filter,
            transform_label(self.transform),
            self.resolution
        )
    }
}

/// `On` / `Off`, as written in reports.
pub fn transform_label(on: bool) -> &'static str {
    if on { "On" } else { "Off" }
}

impl BenchConfig {
    pub fn from_json_str(s: &str) -> VidfxResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| VidfxError::validation(format!("bench config: {e}")))
    }

    pub fn from_json_file(path: &Path) -> VidfxResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> VidfxResult<()> {
        let empty = [
            ("backends", self.backends.is_empty()),
            ("filters", self.filters.is_empty()),
            ("transforms", self.transforms.is_empty()),
            ("resolutions", self.resolutions.is_empty()),
        ];
        if let Some((name, _)) = empty.iter().find(|(_, e)| *e) {
            return Err(VidfxError::validation(format!("bench matrix has no {name}")));
        }
        for (name, secs) in [("warmup_secs", self.warmup_secs), ("sample_secs", self.sample_secs)] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(VidfxError::validation(format!(
                    "{name} must be a non-negative number of seconds, got {secs}"
                )));
            }
        }
        if self.sample_secs == 0.0 {
            return Err(VidfxError::validation("sample_secs must be > 0"));
        }
        if self.max_idle_ticks == 0 {
            return Err(VidfxError::validation("max_idle_ticks must be >= 1"));
        }
        Ok(())
    }

    pub fn warmup(&self) -> Duration {
        Duration::try_from_secs_f64(self.warmup_secs).unwrap_or(Duration::ZERO)
    }

    pub fn sample(&self) -> Duration {
        Duration::try_from_secs_f64(self.sample_secs).unwrap_or(Duration::ZERO)
    }

    /// Every configuration: backend outermost, then filter, transform, resolution.
    pub fn configurations(&self) -> Vec<BenchConfiguration> {
        let mut out = Vec::with_capacity(
            self.backends.len() * self.filters.len() * self.transforms.len() * self.resolutions.len(),
        );
        for &backend in &self.backends {
            for &filter in &self.filters {
                for &transform in &self.transforms {
                    for &resolution in &self.resolutions {
                        out.push(BenchConfiguration {
                            backend,
                            filter,
                            transform,
                            resolution,
                        });
                    }
                }
            }
        }
        out
    }

    pub fn settings_for(&self, c: &BenchConfiguration) -> FrameSettings {
        FrameSettings {
            filter: c.filter,
            filter_params: self.filter_params,
            affine_params: self.affine_params,
            transform_enabled: c.transform,
        }
        .sanitized()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bench/config.rs"]
mod tests;
