//! Error types for the panel controller

use std::path::PathBuf;

use charsheet_core::{EditError, HostError, SheetError};
use thiserror::Error;

/// Errors raised by the panel
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

impl From<HostError> for PanelError {
    fn from(e: HostError) -> Self {
        PanelError::Sheet(e.into())
    }
}

impl From<EditError> for PanelError {
    fn from(e: EditError) -> Self {
        PanelError::Sheet(e.into())
    }
}

/// Result type alias for panel operations
pub type PanelResult<T> = Result<T, PanelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_error_wraps_as_sheet_error() {
        let err: PanelError = HostError::Closed.into();
        assert!(matches!(err, PanelError::Sheet(SheetError::Host(HostError::Closed))));
        assert_eq!(err.to_string(), "Host error: Host connection closed");
    }

    #[test]
    fn test_edit_error_display() {
        let err: PanelError = EditError::MissingField("id").into();
        assert_eq!(err.to_string(), "Edit error: Missing form field: id");
    }
}
