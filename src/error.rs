//! Error taxonomy for page enhancements.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is terminal at the point where a feature catches it: the
//! feature logs the error and either falls back to the next-best path or
//! stops. Nothing here is ever rendered as user-visible text.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// A browser capability (API, element, storage) is missing.
    #[error("capability unavailable: {0}")]
    Unavailable(&'static str),
    /// An async browser operation rejected, e.g. permission denied or the
    /// user dismissed the share sheet.
    #[error("operation rejected: {0}")]
    Rejected(String),
    /// The synchronous legacy copy command failed or was not enabled.
    #[error("copy command failed: {0}")]
    CommandFailed(String),
    #[error("invalid share payload: {0}")]
    InvalidSharePayload(#[source] serde_json::Error),
    #[error("invalid site config: {0}")]
    InvalidConfig(#[source] serde_json::Error),
}

impl PageError {
    /// Stable code used as the prefix of log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_UNAVAILABLE",
            Self::Rejected(_) => "E_REJECTED",
            Self::CommandFailed(_) => "E_COMMAND_FAILED",
            Self::InvalidSharePayload(_) => "E_SHARE_PAYLOAD",
            Self::InvalidConfig(_) => "E_CONFIG",
        }
    }
}
