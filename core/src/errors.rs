//! Tracker error types
//!
//! One taxonomy for every layer: credential checks, role/scope gating,
//! field validation, uniqueness conflicts, lookups, and storage failures.
//! Validation and duplicate-key errors are recoverable at the caller;
//! storage errors abort the operation with no partial writes.

use thiserror::Error;

/// Error category for structured logging and behavior mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad credentials. Deliberately generic, never leaks which part failed.
    Authentication,
    /// Role or project-scope check failed. Blocks the action entirely.
    Authorization,
    /// Missing or malformed required fields
    Validation,
    /// Uniqueness violation on a declared-unique column or pair
    DuplicateKey,
    /// Referenced entity missing (deleted concurrently or never existed)
    NotFound,
    /// Connection/query failure in the relational store
    Storage,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION",
            Self::Authorization => "AUTHORIZATION",
            Self::Validation => "VALIDATION",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::NotFound => "NOT_FOUND",
            Self::Storage => "STORAGE",
        }
    }

    /// Whether the caller can fix the input and retry the same operation
    pub fn recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation | Self::DuplicateKey | Self::Authentication
        )
    }
}

/// Tracker error with category and context
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    #[error("not permitted: {message}")]
    Authorization { message: String },

    #[error("invalid input: {message}")]
    Validation { message: String },

    #[error("already exists: {message}")]
    DuplicateKey { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TrackerError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::DuplicateKey { .. } => ErrorCategory::DuplicateKey,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Storage { .. } => ErrorCategory::Storage,
        }
    }

    /// Create the generic credential-failure error.
    ///
    /// Always the same message regardless of whether the identifier was
    /// unknown or the password wrong.
    pub fn authentication() -> Self {
        Self::Authentication {
            message: "invalid identifier or password".to_string(),
        }
    }

    /// Create an authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a duplicate-key error
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::DuplicateKey {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error with source
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl Clone for TrackerError {
    fn clone(&self) -> Self {
        match self {
            Self::Authentication { message } => Self::Authentication {
                message: message.clone(),
            },
            Self::Authorization { message } => Self::Authorization {
                message: message.clone(),
            },
            Self::Validation { message } => Self::Validation {
                message: message.clone(),
            },
            Self::DuplicateKey { message } => Self::DuplicateKey {
                message: message.clone(),
            },
            Self::NotFound { message } => Self::NotFound {
                message: message.clone(),
            },
            Self::Storage { message, .. } => Self::Storage {
                message: message.clone(),
                source: None,
            },
        }
    }
}

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_stable_codes() {
        assert_eq!(ErrorCategory::DuplicateKey.as_str(), "DUPLICATE_KEY");
        assert_eq!(
            TrackerError::duplicate_key("project name taken").category(),
            ErrorCategory::DuplicateKey
        );
        assert_eq!(
            TrackerError::authorization("not your project").category(),
            ErrorCategory::Authorization
        );
    }

    #[test]
    fn authentication_message_is_generic() {
        // Unknown identifier and wrong password must be indistinguishable.
        let a = TrackerError::authentication();
        let b = TrackerError::authentication();
        assert_eq!(a.to_string(), b.to_string());
        assert!(!a.to_string().contains("username"));
    }

    #[test]
    fn clone_drops_storage_source() {
        let err = TrackerError::storage_with_source("insert failed", std::io::Error::other("disk"));
        let cloned = err.clone();
        match cloned {
            TrackerError::Storage { source, .. } => assert!(source.is_none()),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
