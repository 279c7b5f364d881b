//! Error types for marsdash-core
//!
//! Every failure the dashboard can report, with error codes, severities
//! and suggestions for the API layer to render.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Date range missing, unparsable or reversed
    InvalidRange,
    /// Malformed annotation record
    ValidationError,
    /// Ledger has no postings
    NoTransactions,
    /// Ledger query failed
    UpstreamQuery,
    /// Ledger not loaded
    NotLoaded,
    /// Ledger source could not be parsed
    ParseError,
    /// IO error
    IoError,
    /// Serialization error
    SerializationError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InvalidRange => write!(f, "INVALID_RANGE"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::NoTransactions => write!(f, "NO_TRANSACTIONS"),
            ErrorCode::UpstreamQuery => write!(f, "UPSTREAM_QUERY"),
            ErrorCode::NotLoaded => write!(f, "NOT_LOADED"),
            ErrorCode::ParseError => write!(f, "PARSE_ERROR"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::SerializationError => write!(f, "SERIALIZATION_ERROR"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Caller mistake, nothing is wrong with the service
    Info,
    /// Operation failed but may succeed once the ledger changes
    Warning,
    /// Operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for marsdash-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid date range: {message}")]
    InvalidRange { message: String },

    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("No transactions found in the ledger")]
    NoTransactions,

    #[error("Query failed: {query}: {message}")]
    UpstreamQuery { query: String, message: String },

    #[error("Ledger not loaded")]
    NotLoaded,

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl CoreError {
    pub fn invalid_range(message: impl Into<String>) -> Self {
        CoreError::InvalidRange {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::InvalidRange { .. } => ErrorCode::InvalidRange,
            CoreError::Validation { .. } => ErrorCode::ValidationError,
            CoreError::NoTransactions => ErrorCode::NoTransactions,
            CoreError::UpstreamQuery { .. } => ErrorCode::UpstreamQuery,
            CoreError::NotLoaded => ErrorCode::NotLoaded,
            CoreError::Parse { .. } => ErrorCode::ParseError,
            CoreError::Io { .. } => ErrorCode::IoError,
            CoreError::Serialization { .. } => ErrorCode::SerializationError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::InvalidRange { .. } | CoreError::Validation { .. } => ErrorSeverity::Info,
            CoreError::NoTransactions | CoreError::NotLoaded => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::InvalidRange { .. } => {
                details = details.with_suggestion(
                    "Pass start_date and end_date as YYYY-MM-DD with end_date >= start_date.".to_string(),
                );
            }
            CoreError::Validation { field, message } => {
                details = details.with_detail(serde_json::json!({ "field": field, "reason": message }));
                details = details.with_suggestion(
                    "Format keys must be 'transaction' or 'description'; styles must be 'bold' or 'italic'.".to_string(),
                );
            }
            CoreError::NoTransactions => {
                details = details.with_suggestion(
                    "Add at least one transaction to the ledger, or pass an explicit range.".to_string(),
                );
            }
            CoreError::UpstreamQuery { query, .. } => {
                details = details.with_detail(serde_json::json!({ "query": query }));
            }
            CoreError::NotLoaded => {
                details = details.with_suggestion(
                    "Check data.path and data.main_file, then POST /api/reload.".to_string(),
                );
            }
            CoreError::Parse { message } => {
                details = details.with_detail(serde_json::json!({ "parse_message": message }));
                details = details.with_suggestion("Check the syntax of your Beancount file.".to_string());
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<marsdash_parser::ParseError> for CoreError {
    fn from(error: marsdash_parser::ParseError) -> Self {
        CoreError::Parse {
            message: error.to_string(),
        }
    }
}

// ==================== Tests ====================
