use std::path::{Path, PathBuf};

use crate::foundation::{
    core::FilterKind,
    error::{VidfxError, VidfxResult},
};

/// WGSL text for the three programs, each already prefixed with the shared `common.wgsl`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSources {
    pub passthrough: String,
    pub pixelate: String,
    pub keep_color: String,
}

impl ShaderSources {
    pub fn from_parts(common: &str, passthrough: &str, pixelate: &str, keep_color: &str) -> Self {
        let join = |program: &str| format!("{common}\n{program}");
        Self {
            passthrough: join(passthrough),
            pixelate: join(pixelate),
            keep_color: join(keep_color),
        }
    }

    /// Program used for `filter`, with its name for diagnostics.
    pub fn program(&self, filter: FilterKind) -> (&'static str, &str) {
        match filter {
            FilterKind::None => ("passthrough", &self.passthrough),
            FilterKind::Pixelate => ("pixelate", &self.pixelate),
            FilterKind::KeepColor => ("keep_color", &self.keep_color),
        }
    }
}

/// Supplies shader text to the GPU backend.
pub trait ShaderLoader {
    fn load(&self) -> VidfxResult<ShaderSources>;
}

/// The copies of `shaders/*.wgsl` compiled into the crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinShaders;

impl ShaderLoader for BuiltinShaders {
    fn load(&self) -> VidfxResult<ShaderSources> {
        Ok(ShaderSources::from_parts(
            include_str!("../../shaders/common.wgsl"),
            include_str!("../../shaders/passthrough.wgsl"),
            include_str!("../../shaders/pixelate.wgsl"),
            include_str!("../../shaders/keep_color.wgsl"),
        ))
    }
}

/// Reads `common.wgsl`, `passthrough.wgsl`, `pixelate.wgsl` and `keep_color.wgsl` from a
/// directory, so shaders can be edited without rebuilding.
#[derive(Clone, Debug)]
pub struct DirShaderLoader {
    root: PathBuf,
}

impl DirShaderLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, name: &str) -> VidfxResult<String> {
        let path = self.root.join(name);
        std::fs::read_to_string(&path).map_err(|e| {
            VidfxError::validation(format!("read shader {}: {e}", path.display()))
        })
    }
}

impl ShaderLoader for DirShaderLoader {
    fn load(&self) -> VidfxResult<ShaderSources> {
        tracing::debug!(root = %self.root.display(), "loading shaders from directory");
        Ok(ShaderSources::from_parts(
            &self.read("common.wgsl")?,
            &self.read("passthrough.wgsl")?,
            &self.read("pixelate.wgsl")?,
            &self.read("keep_color.wgsl")?,
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/shaders.rs"]
mod tests;
