use super::error::{ErrorCategory, RenderError};

/// What happens after a failure has been logged.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FailureMode {
    /// Log, then panic. Nothing continues past the failing call.
    Abort,
    /// Log, then hand the error back to the caller.
    Propagate,
}

/// Per-category failure handling.
///
/// The default aborts on everything, matching a renderer with no degraded mode.
/// Tools and tests can opt individual categories into [`FailureMode::Propagate`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ErrorPolicy {
    pub device: FailureMode,
    pub asset: FailureMode,
    pub contract: FailureMode,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::abort_all()
    }
}

impl ErrorPolicy {
    pub const fn abort_all() -> Self {
        Self {
            device: FailureMode::Abort,
            asset: FailureMode::Abort,
            contract: FailureMode::Abort,
        }
    }

    pub const fn propagate_all() -> Self {
        Self {
            device: FailureMode::Propagate,
            asset: FailureMode::Propagate,
            contract: FailureMode::Propagate,
        }
    }

    pub fn mode_for(&self, category: ErrorCategory) -> FailureMode {
        match category {
            ErrorCategory::Device => self.device,
            ErrorCategory::Asset => self.asset,
            ErrorCategory::Contract => self.contract,
        }
    }

    /// Logs `err` and applies the configured mode.
    ///
    /// Returns the error back only under [`FailureMode::Propagate`].
    #[track_caller]
    pub fn escalate(&self, err: RenderError) -> RenderError {
        let category = err.category();
        log::error!("{category:?} failure: {err}");

        match self.mode_for(category) {
            FailureMode::Abort => panic!("fatal {category:?} failure: {err}"),
            FailureMode::Propagate => err,
        }
    }
}
