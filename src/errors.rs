// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for configuration items and the signature catalog

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an [`ItemError`]
///
/// Collaborators (collection store, transport) translate failures into
/// user-facing messages by kind rather than by variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong representation for the field
    TypeMismatch,
    /// Correct representation, but a domain rule is broken
    ConstraintViolation,
    /// An explicit validity gate failed
    Validation,
    /// A field, or a by-name reference, could not be resolved
    Lookup,
}

/// Errors raised while mutating or validating a configuration item
///
/// Every variant is raised before any mutation is committed: the item keeps
/// its previous value for the field involved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// Input representation does not match what the field accepts
    #[error("Type mismatch for field '{field}': expected {expected}, got {received}")]
    TypeMismatch {
        field: String,
        expected: String,
        received: &'static str,
    },

    /// Input has the right representation but breaks a domain rule
    #[error("Constraint violated for field '{field}': {reason}")]
    ConstraintViolation { field: String, reason: String },

    /// Mandatory invariant unmet at the validity gate
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Field name not declared by the item's contract table
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Parent reference names an item the lookup does not know
    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    /// Parent chain loops back onto itself
    #[error("Parent chain loops through: {0}")]
    ParentLoop(String),
}

impl ItemError {
    pub(crate) fn constraint(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::ConstraintViolation { .. } => ErrorKind::ConstraintViolation,
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnknownField(_) | Self::ParentNotFound(_) | Self::ParentLoop(_) => {
                ErrorKind::Lookup
            }
        }
    }

    pub fn is_type_mismatch(&self) -> bool {
        self.kind() == ErrorKind::TypeMismatch
    }

    pub fn is_constraint_violation(&self) -> bool {
        self.kind() == ErrorKind::ConstraintViolation
    }
}

/// Result type for item operations
pub type ItemResult<T> = Result<T, ItemError>;

/// Errors that can occur while loading the signature catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog document could not be read
    #[error("Failed to read signature catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog document is not valid JSON for the expected structure
    #[error("Failed to parse signature catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// A breed lists boot loaders for an architecture we do not know
    #[error("Breed '{breed}' references unknown architecture '{arch}'")]
    UnknownArch { breed: String, arch: String },

    /// A breed's kernel/initrd file pattern is not a valid regex
    #[error("Breed '{breed}' has an invalid file pattern: {source}")]
    InvalidPattern {
        breed: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = ItemError::TypeMismatch {
            field: "arch".into(),
            expected: "string".into(),
            received: "list",
        };
        assert!(err.is_type_mismatch());
        assert!(!err.is_constraint_violation());

        let err = ItemError::constraint("breed", "unknown breed 'Test'");
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
        assert_eq!(
            err.to_string(),
            "Constraint violated for field 'breed': unknown breed 'Test'"
        );

        assert_eq!(ItemError::ParentLoop("a".into()).kind(), ErrorKind::Lookup);

        let err = ItemError::UnknownField("bogus".into());
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(!err.is_type_mismatch());
        assert_eq!(ItemError::Validation("x".into()).kind(), ErrorKind::Validation);
    }
}
