//! Shortcuts error types.

use thiserror::Error;

/// Result type for shortcuts operations.
pub type Result<T> = std::result::Result<T, ShortcutsError>;

/// Errors raised by the facade or surfaced from the management client.
#[derive(Debug, Error)]
pub enum ShortcutsError {
    /// The remote resource does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Input rejected before any remote call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The service rejected the request because of existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A resource group the resource depends on could not be ensured.
    #[error("Failed to ensure resource group '{group}': {source}")]
    Dependency {
        /// Name of the resource group.
        group: String,
        /// Underlying failure.
        #[source]
        source: Box<ShortcutsError>,
    },

    /// Network or authentication failure reported by the client.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Verb called on a wrapper in an incompatible lifecycle state.
    #[error("Cannot {operation} a resource in state '{state}'")]
    InvalidState {
        /// The verb that was attempted.
        operation: &'static str,
        /// The lifecycle state the wrapper was in.
        state: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Native record could not be converted.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a [`ShortcutsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ShortcutsError::NotFound`].
    NotFound,
    /// See [`ShortcutsError::Validation`].
    Validation,
    /// See [`ShortcutsError::Conflict`].
    Conflict,
    /// See [`ShortcutsError::Dependency`].
    Dependency,
    /// See [`ShortcutsError::Transport`].
    Transport,
    /// See [`ShortcutsError::InvalidState`].
    InvalidState,
    /// See [`ShortcutsError::Config`].
    Config,
    /// See [`ShortcutsError::Serialization`].
    Serialization,
}

impl ShortcutsError {
    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Wrap a failure that happened while ensuring a resource group.
    pub fn dependency(group: impl Into<String>, source: ShortcutsError) -> Self {
        Self::Dependency {
            group: group.into(),
            source: Box::new(source),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(operation: &'static str, state: &'static str) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Dependency { .. } => ErrorKind::Dependency,
            Self::Transport(_) => ErrorKind::Transport,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Config(_) => ErrorKind::Config,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Check if this is a transport error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_error_keeps_source() {
        let err = ShortcutsError::dependency("rg1", ShortcutsError::transport("connection reset"));
        assert_eq!(err.kind(), ErrorKind::Dependency);

        let display = err.to_string();
        assert!(display.contains("rg1"));
        assert!(display.contains("connection reset"));

        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Transport error: connection reset"));
    }

    #[test]
    fn test_invalid_state_display() {
        let err = ShortcutsError::invalid_state("refresh", "defined");
        assert_eq!(err.to_string(), "Cannot refresh a resource in state 'defined'");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_kind_helpers() {
        assert!(ShortcutsError::not_found("x").is_not_found());
        assert!(ShortcutsError::validation("x").is_validation());
        assert!(ShortcutsError::conflict("x").is_conflict());
        assert!(ShortcutsError::transport("x").is_transport());
        assert!(!ShortcutsError::transport("x").is_not_found());
    }
}
