//! Error types for nudge operations.
//!
//! The hierarchy mirrors how a failure is recovered from: schema violations
//! are fixed by the author, persistence failures are retried, generation
//! failures discard the candidate, and authorization failures are reported
//! before any collaborator is contacted.

use thiserror::Error;

use crate::rule::Violation;

/// Result type alias for nudge operations.
pub type NudgeResult<T> = Result<T, NudgeError>;

/// Main error type for all nudge operations.
#[derive(Error, Debug)]
pub enum NudgeError {
    /// A rule failed Draft to Valid validation.
    #[error("Schema violation: {message}")]
    SchemaViolation {
        message: String,
        code: ErrorCode,
        violations: Vec<Violation>,
    },

    /// The persistence collaborator rejected or timed out.
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The generation collaborator returned malformed or schema-invalid output.
    #[error("Generation error: {message}")]
    Generation {
        message: String,
        code: ErrorCode,
        violations: Vec<Violation>,
        raw: Option<String>,
    },

    /// A write was attempted without a sufficient role.
    #[error("Authorization denied: {message}")]
    AuthorizationDenied {
        message: String,
        code: ErrorCode,
        role: Option<String>,
    },

    /// Rule not present in the working set or the store.
    #[error("Rule not found: {rule_id}")]
    NotFound { rule_id: String },

    /// A save for the same rule id is already in flight.
    #[error("Save already in progress for rule '{rule_id}'")]
    SaveInProgress { rule_id: String },

    /// Invalid argument to an editing operation.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// LLM transport or provider failure.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Schema (SCHEMA_xxx)
    SchemaInvalidRule,
    SchemaDuplicateId,

    // Persistence (STORE_xxx)
    StoreOperationFailed,
    StoreTimeout,
    StoreCorrupted,

    // Generation (GEN_xxx)
    GenMalformedOutput,
    GenSchemaInvalid,
    GenTimeout,

    // Authorization (AUTH_xxx)
    AuthWriteDenied,
    AuthMissingRole,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValIndexOutOfBounds,

    // LLM (LLM_xxx)
    LlmConnectionFailed,
    LlmInvalidResponse,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseInvalidTimestamp,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SchemaInvalidRule => "SCHEMA_001",
            ErrorCode::SchemaDuplicateId => "SCHEMA_002",
            ErrorCode::StoreOperationFailed => "STORE_001",
            ErrorCode::StoreTimeout => "STORE_002",
            ErrorCode::StoreCorrupted => "STORE_003",
            ErrorCode::GenMalformedOutput => "GEN_001",
            ErrorCode::GenSchemaInvalid => "GEN_002",
            ErrorCode::GenTimeout => "GEN_003",
            ErrorCode::AuthWriteDenied => "AUTH_001",
            ErrorCode::AuthMissingRole => "AUTH_002",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValIndexOutOfBounds => "VAL_002",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmInvalidResponse => "LLM_002",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseInvalidTimestamp => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl NudgeError {
    /// Create a schema violation carrying the offending findings.
    pub fn schema(message: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self::SchemaViolation {
            message: message.into(),
            code: ErrorCode::SchemaInvalidRule,
            violations,
        }
    }

    /// Create a duplicate-id schema violation.
    pub fn duplicate_id(rule_id: impl AsRef<str>) -> Self {
        Self::SchemaViolation {
            message: format!("Rule id '{}' is already used by another rule", rule_id.as_ref()),
            code: ErrorCode::SchemaDuplicateId,
            violations: Vec::new(),
        }
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            code: ErrorCode::StoreOperationFailed,
            source: None,
        }
    }

    /// Create a generation error for output that could not be parsed.
    pub fn generation(message: impl Into<String>, raw: Option<String>) -> Self {
        Self::Generation {
            message: message.into(),
            code: ErrorCode::GenMalformedOutput,
            violations: Vec::new(),
            raw,
        }
    }

    /// Create a generation error for a parsed but invalid candidate.
    pub fn generation_invalid(message: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self::Generation {
            message: message.into(),
            code: ErrorCode::GenSchemaInvalid,
            violations,
            raw: None,
        }
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>, role: Option<String>) -> Self {
        Self::AuthorizationDenied {
            message: message.into(),
            code: ErrorCode::AuthWriteDenied,
            role,
        }
    }

    /// Create a not found error.
    pub fn not_found(rule_id: impl Into<String>) -> Self {
        Self::NotFound {
            rule_id: rule_id.into(),
        }
    }

    /// Create a validation error for a bad argument.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create an index out of bounds error.
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Self::Validation {
            message: format!("Index {} is out of bounds for a group of {} children", index, len),
            code: ErrorCode::ValIndexOutOfBounds,
            suggestion: Some(format!("Use an index below {}", len)),
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmConnectionFailed,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SchemaViolation { code, .. } => *code,
            Self::Persistence { code, .. } => *code,
            Self::Generation { code, .. } => *code,
            Self::AuthorizationDenied { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Findings attached to schema and generation failures.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::SchemaViolation { violations, .. } | Self::Generation { violations, .. } => {
                violations
            }
            _ => &[],
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::SchemaViolation { .. } => Some("Fix the listed fields and save again"),
            Self::Persistence { .. } => Some("Local edits were kept; retry the save"),
            Self::Generation { .. } => Some("Rephrase the prompt or build the rule by hand"),
            Self::AuthorizationDenied { .. } => Some("Ask an administrator for write access"),
            Self::SaveInProgress { .. } => Some("Wait for the current save to finish"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Llm { .. } => Some("Please check your LLM provider configuration"),
            _ => None,
        }
    }

    /// Whether the failure leaves local state untouched and can simply be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persistence { .. } | Self::SaveInProgress { .. } | Self::Llm { .. }
        )
    }
}

impl From<rusqlite::Error> for NudgeError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence {
            message: err.to_string(),
            code: ErrorCode::StoreOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}
