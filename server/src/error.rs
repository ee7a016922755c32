//! Error types for the Bookmarker LSP server.

use bookmarker_store::StoreError;
use thiserror::Error;

/// Errors that can occur in the LSP server.
#[derive(Debug, Error)]
pub enum LspError {
    #[error("Bookmark storage is not initialized (no workspace open)")]
    StoreNotInitialized,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),
}

impl From<LspError> for tower_lsp::jsonrpc::Error {
    fn from(err: LspError) -> Self {
        let code = match &err {
            LspError::InvalidUri(_) => tower_lsp::jsonrpc::ErrorCode::InvalidParams,
            LspError::Store(StoreError::InvalidFormat) => {
                tower_lsp::jsonrpc::ErrorCode::InvalidParams
            }
            _ => tower_lsp::jsonrpc::ErrorCode::InternalError,
        };

        tower_lsp::jsonrpc::Error {
            code,
            message: err.to_string().into(),
            data: None,
        }
    }
}

/// Result type alias for LSP operations.
pub type LspResult<T> = Result<T, LspError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::jsonrpc::ErrorCode;

    #[test]
    fn test_store_not_initialized_display() {
        let err = LspError::StoreNotInitialized;
        assert!(err.to_string().contains("no workspace open"));
    }

    #[test]
    fn test_invalid_uri_maps_to_invalid_params() {
        let err: tower_lsp::jsonrpc::Error = LspError::InvalidUri("not-a-uri".to_string()).into();
        assert_eq!(err.code, ErrorCode::InvalidParams);
        assert!(err.message.contains("Invalid URI"));
    }

    #[test]
    fn test_invalid_format_maps_to_invalid_params() {
        let err: tower_lsp::jsonrpc::Error = LspError::Store(StoreError::InvalidFormat).into();
        assert_eq!(err.code, ErrorCode::InvalidParams);
        assert!(err.message.contains("Invalid bookmark file format"));
    }

    #[test]
    fn test_no_workspace_store_error_is_internal() {
        let err: tower_lsp::jsonrpc::Error = LspError::Store(StoreError::NoWorkspace).into();
        assert_eq!(err.code, ErrorCode::InternalError);
    }

    #[test]
    fn test_from_store_error() {
        let lsp_err: LspError = StoreError::InvalidFormat.into();
        match lsp_err {
            LspError::Store(StoreError::InvalidFormat) => {}
            _ => panic!("Expected LspError::Store"),
        }
    }
}
