use serde::{Deserialize, Serialize};

use crate::error::{PurseError, Result};

/// Well-known status codes reported by the billing backend.
///
/// The core only ever asks "is this OK"; the remaining constants exist so
/// callers and backends can name what they send.
pub struct ResponseCode;

impl ResponseCode {
    pub const SERVICE_TIMEOUT: i32 = -3;
    pub const FEATURE_NOT_SUPPORTED: i32 = -2;
    pub const SERVICE_DISCONNECTED: i32 = -1;
    pub const OK: i32 = 0;
    pub const USER_CANCELED: i32 = 1;
    pub const SERVICE_UNAVAILABLE: i32 = 2;
    pub const BILLING_UNAVAILABLE: i32 = 3;
    pub const ITEM_UNAVAILABLE: i32 = 4;
    pub const DEVELOPER_ERROR: i32 = 5;
    pub const ERROR: i32 = 6;
    pub const ITEM_ALREADY_OWNED: i32 = 7;
    pub const ITEM_NOT_OWNED: i32 = 8;
    pub const NETWORK_ERROR: i32 = 12;
}

/// The shape every backend response collapses to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub status_code: i32,
    #[serde(default)]
    pub debug_message: String,
}

impl OperationResult {
    pub fn new(status_code: i32, debug_message: impl Into<String>) -> Self {
        Self {
            status_code,
            debug_message: debug_message.into(),
        }
    }

    /// A success result with an empty debug message.
    pub fn ok() -> Self {
        Self::new(ResponseCode::OK, "")
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == ResponseCode::OK
    }

    /// Converts a non-success result into `PurseError::BackendFailure`.
    pub fn into_result(self) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(PurseError::BackendFailure {
                status_code: self.status_code,
                debug_message: self.debug_message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_passes_ok_through() {
        let result = OperationResult::ok().into_result().unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn test_into_result_surfaces_backend_failure_verbatim() {
        let err = OperationResult::new(ResponseCode::ITEM_ALREADY_OWNED, "owned")
            .into_result()
            .unwrap_err();

        assert_eq!(
            err,
            PurseError::BackendFailure {
                status_code: 7,
                debug_message: "owned".to_string(),
            }
        );
    }
}
