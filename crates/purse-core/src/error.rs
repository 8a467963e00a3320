//! Error types for the purchase session core.

use serde::Serialize;
use thiserror::Error;

use crate::connection::ConnectionState;
use crate::model::{OperationResult, ResponseCode};

/// A shared error type for the entire purse workspace.
///
/// The first four variants are the session taxonomy: they describe why a
/// command was refused before (or instead of) reaching the backend. The rest
/// cover the ambient layers (configuration, files, serialization).
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum PurseError {
    /// A product or purchase identifier is not present in the session caches.
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A subscription product carries no offer for the requested base plan.
    #[error("No offer for base plan '{base_plan_id}' on product '{product_id}'")]
    OfferNotFound {
        product_id: String,
        base_plan_id: String,
    },

    /// Non-success result reported by the billing backend, surfaced verbatim.
    #[error("Backend failure ({status_code}): {debug_message}")]
    BackendFailure {
        status_code: i32,
        debug_message: String,
    },

    /// Caller input that cannot be turned into a backend request.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The command needs a ready connection.
    #[error("Billing connection is not ready (state: {state})")]
    NotConnected { state: ConnectionState },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PurseError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an OfferNotFound error
    pub fn offer_not_found(product_id: impl Into<String>, base_plan_id: impl Into<String>) -> Self {
        Self::OfferNotFound {
            product_id: product_id.into(),
            base_plan_id: base_plan_id.into(),
        }
    }

    /// Creates a MalformedInput error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Serialization error for the given format
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an OfferNotFound error
    pub fn is_offer_not_found(&self) -> bool {
        matches!(self, Self::OfferNotFound { .. })
    }

    /// Check if this is a MalformedInput error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedInput(_))
    }

    /// Check if this is a NotConnected error
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected { .. })
    }

    /// Collapses the error into the failure-shaped result UI layers expect.
    ///
    /// Backend failures keep their own status code; everything else is
    /// mapped onto the closest backend code so callers that only understand
    /// `OperationResult` can still branch on it.
    pub fn to_operation_result(&self) -> OperationResult {
        let status_code = match self {
            Self::NotFound { .. } | Self::OfferNotFound { .. } => ResponseCode::ITEM_UNAVAILABLE,
            Self::MalformedInput(_) => ResponseCode::DEVELOPER_ERROR,
            Self::NotConnected { .. } => ResponseCode::SERVICE_DISCONNECTED,
            Self::BackendFailure { status_code, .. } => *status_code,
            _ => ResponseCode::ERROR,
        };

        OperationResult::new(status_code, self.to_string())
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PurseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for PurseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, PurseError>`.
pub type Result<T> = std::result::Result<T, PurseError>;
