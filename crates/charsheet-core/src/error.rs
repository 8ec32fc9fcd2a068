//! Error types for the character sheet panel

use thiserror::Error;

/// Top-level error type for the character sheet panel
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Edit error: {0}")]
    Edit(#[from] EditError),
}

/// Errors reported by the host application
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Host rejected request: {0}")]
    Rejected(String),

    #[error("Context menu not found: {0}")]
    MenuNotFound(String),

    #[error("Host connection closed")]
    Closed,
}

/// Errors related to a submitted sheet form
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Empty value for form field: {0}")]
    EmptyField(&'static str),
}

/// Result type alias for sheet operations
pub type SheetResult<T> = Result<T, SheetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_error_display() {
        let err = HostError::Rejected("missing UPDATE permission".to_string());
        assert!(format!("{}", err).contains("rejected"));
        assert!(format!("{}", err).contains("UPDATE"));

        let err = HostError::MenuNotFound("io.charsheet/menu/toggle".to_string());
        assert!(format!("{}", err).contains("menu/toggle"));

        assert!(format!("{}", HostError::Closed).contains("closed"));
    }

    #[test]
    fn test_edit_error_display() {
        let err = EditError::MissingField("id");
        assert!(format!("{}", err).contains("Missing form field"));
        assert!(format!("{}", err).contains("id"));

        let err = EditError::EmptyField("id");
        assert!(format!("{}", err).contains("Empty value"));
    }

    #[test]
    fn test_error_conversions() {
        let err: SheetError = HostError::Closed.into();
        assert!(matches!(err, SheetError::Host(_)));

        let err: SheetError = EditError::MissingField("id").into();
        assert!(matches!(err, SheetError::Edit(_)));
        assert!(format!("{}", err).contains("Edit error"));
    }
}
