use std::path::PathBuf;

use thiserror::Error;

/// Device-call failure, collapsed to the set of outcomes a caller could act on.
///
/// No caller branches on the precise backend code; the variant exists so logs and
/// policies can tell memory exhaustion and device loss apart from bad arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device out of memory")]
    OutOfMemory,

    #[error("device lost: {0}")]
    DeviceLost(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("device error: {0}")]
    Unknown(String),
}

/// Shader source artifact problems.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("shader file '{}' doesn't exist", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Carries the full compiler output.
    #[error("failed to compile '{}':\n{message}", path.display())]
    Compile { path: PathBuf, message: String },
}

/// Invalid application or resource configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("fixed update rate must be greater than zero (got {0})")]
    ZeroFixedRate(f32),

    #[error("unknown buffer usage value {0}")]
    UnknownUsage(u32),

    #[error("unknown primitive topology value {0}")]
    UnknownTopology(u32),
}

/// Named uniform layout misuse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UniformError {
    #[error("uniform entry '{name}' is {expected} bytes, got {actual}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Umbrella error returned by renderer operations.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Uniform(#[from] UniformError),

    /// A caller broke a documented precondition.
    #[error("contract violation: {0}")]
    Contract(String),
}

impl RenderError {
    pub fn contract(msg: impl Into<String>) -> Self {
        RenderError::Contract(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RenderError::Device(_) => ErrorCategory::Device,
            RenderError::Asset(_) => ErrorCategory::Asset,
            RenderError::Config(_) | RenderError::Uniform(_) | RenderError::Contract(_) => {
                ErrorCategory::Contract
            }
        }
    }
}

/// Coarse grouping used by [`ErrorPolicy`](super::ErrorPolicy).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorCategory {
    /// Device or resource-creation call failed.
    Device,
    /// Missing or uncompilable shader source.
    Asset,
    /// Configuration errors and caller precondition violations.
    Contract,
}
