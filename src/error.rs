//! Error types for metadata registration, statement generation and execution helpers

use crate::relation::RelationKind;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the registry, the statement builders and the execution helpers
///
/// `Config` and `TypeShape` are programmer errors and should abort startup.
/// `NotRegistered`, `RelationNotFound` and `UnsupportedRelationKind` are ordinary
/// recoverable results. `UpdateFailed` is the expected optimistic-lock outcome.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or incomplete annotations on a record type
    #[error("invalid metadata for `{entity}`: {message}")]
    Config { entity: String, message: String },

    /// No descriptor registered for the record type or logical name
    #[error("type not registered: {0}")]
    NotRegistered(String),

    /// The named relation does not exist on the resolved descriptor
    #[error("relation {relation:?} not found on `{entity}`")]
    RelationNotFound { entity: String, relation: String },

    /// The operation does not support the relation's kind
    #[error("relation {relation:?} is {kind}, which {operation} does not support")]
    UnsupportedRelationKind {
        relation: String,
        kind: RelationKind,
        operation: &'static str,
    },

    /// A keyed update or delete did not affect exactly one row
    #[error("update failed (not found or version conflict)")]
    UpdateFailed,

    /// A declared field is missing or has an unexpected shape
    #[error("type shape error: {0}")]
    TypeShape(String),

    /// A stored value could not be converted into the field's type
    #[error("cannot decode column `{column}`: {message}")]
    Decode { column: String, message: String },

    /// Failure reported by the external statement executor
    #[error("executor error: {0}")]
    Executor(String),
}

impl Error {
    pub(crate) fn config(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub(crate) fn relation_not_found(
        entity: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Error::RelationNotFound {
            entity: entity.into(),
            relation: relation.into(),
        }
    }

    /// Wrap a driver error for return from an [`Executor`](crate::Executor) implementation
    pub fn executor(err: impl std::fmt::Display) -> Self {
        Error::Executor(err.to_string())
    }

    /// True for the optimistic-lock outcome (stale version or missing row)
    ///
    /// Callers should refresh the record and inform the user rather than retry blindly.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::UpdateFailed)
    }

    /// HTTP-style status code for the error class
    pub fn status_code(&self) -> u16 {
        match self {
            Error::UpdateFailed => 409,
            Error::NotRegistered(_) | Error::RelationNotFound { .. } => 404,
            _ => 500,
        }
    }
}
