//! Domain error taxonomy shared by the repository and API layers.

use crate::types::EntityId;

/// Domain-level errors produced by the core engines.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came up empty.
    #[error("{entity} with id {id} not found")]
    NotFound {
        entity: &'static str,
        id: EntityId,
    },

    /// The request was malformed (bad section name, malformed action, ...).
    /// Rejected before any write; not user-recoverable via retry.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation conflicts with the current state of the aggregate
    /// (e.g. re-reviewing an already approved section).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Anything unexpected. Propagated uncaught to the top-level error
    /// surface; no core-level recovery.
    #[error("Internal error: {0}")]
    Internal(String),
}
