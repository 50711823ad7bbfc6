//! Error taxonomy and failure policy.
//!
//! Every renderer failure is logged through `log` and then either aborts (the
//! default) or is returned to the caller, depending on [`ErrorPolicy`].

mod error;
mod policy;

pub use error::{AssetError, ConfigError, DeviceError, ErrorCategory, RenderError, UniformError};
pub use policy::{ErrorPolicy, FailureMode};

pub type RenderResult<T> = std::result::Result<T, RenderError>;
