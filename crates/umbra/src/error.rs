//! Error types for descriptor and configuration parsing.
//!
//! The participation engine itself never fails: a malformed descriptor or a
//! missing bound input degrades to neutral behavior. Errors only surface from
//! the parsing entry points and from element construction.

use umbra_core::DomError;

/// Result type alias for descriptor and configuration operations.
pub type Result<T> = std::result::Result<T, DescriptorError>;

/// Errors raised while building descriptors, configuration or elements.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// A control kind name that is not one of the supported kinds.
    #[error("Unknown control kind '{0}'")]
    UnknownControl(String),

    /// Descriptor JSON could not be parsed.
    #[error("Invalid descriptor: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration TOML could not be parsed.
    #[error("Invalid forms configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The platform rejected an operation (e.g. internals already attached).
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl DescriptorError {
    /// Create an unknown-control error.
    pub fn unknown_control(name: impl Into<String>) -> Self {
        Self::UnknownControl(name.into())
    }
}
