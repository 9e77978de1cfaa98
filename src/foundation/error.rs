/// Result alias used across the crate.
pub type VidfxResult<T> = Result<T, VidfxError>;

/// Errors surfaced by the library.
///
/// Runtime frame problems (an empty or mis-sized frame on one tick) are not errors at the
/// driver level; they are skipped. Everything here is either an initialization failure or a
/// caller mistake.
#[derive(thiserror::Error, Debug)]
pub enum VidfxError {
    /// Invalid caller input (bad matrix, malformed configuration file, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A frame buffer does not match its declared dimensions.
    #[error("frame error: {0}")]
    Frame(String),

    /// GPU adapter/device/resource failure.
    #[error("gpu error: {0}")]
    Gpu(String),

    /// A shader program failed to compile or link.
    #[error("shader error in {program}: {diagnostic}")]
    Shader {
        /// Program name (`passthrough`, `pixelate`, `keep_color`).
        program: String,
        /// Compiler / validation message.
        diagnostic: String,
    },

    /// Report serialization failure.
    #[error("report error: {0}")]
    Report(String),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VidfxError {
    /// Build a [`VidfxError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VidfxError::Frame`].
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }

    /// Build a [`VidfxError::Gpu`].
    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }

    /// Build a [`VidfxError::Shader`].
    pub fn shader(program: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::Shader {
            program: program.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Build a [`VidfxError::Report`].
    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
