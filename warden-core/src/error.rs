//! Error types for Warden.
//!
//! Provides structured errors with:
//! - Unique error codes shared by every Warden crate
//! - Source error chaining
//! - Classification into validation, state-ordering and authorization
//!   failures, none of which are retried automatically

use thiserror::Error;

/// Result type for Warden core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes shared across the workspace.
///
/// Codes are structured as:
/// - 1xxx: Validation errors (malformed input)
/// - 2xxx: Not found errors
/// - 3xxx: State-ordering errors (retry later, at a valid state)
/// - 4xxx: Authorization errors (never retried)
/// - 6xxx: Internal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidHash = 1001,
    InvalidKey = 1002,
    InvalidSignature = 1003,
    InvalidNode = 1004,
    InvalidAmount = 1005,
    InvalidConfig = 1006,
    InsufficientSignatures = 1007,
    MismatchedLengths = 1008,

    // Not found errors (2xxx)
    NodeNotFound = 2001,
    RoundNotFound = 2002,
    PeriodNotFound = 2003,

    // State-ordering errors (3xxx)
    RoundNotEnded = 3001,
    WindowExceeded = 3002,
    AlreadyCompleted = 3003,
    DuplicateVote = 3004,
    AlreadySettled = 3005,
    PeriodNotClosed = 3006,
    EpochOutOfOrder = 3007,
    Duplicate = 3008,
    NotContinuous = 3009,

    // Authorization errors (4xxx)
    InvalidValidator = 4001,
    Unauthorized = 4002,
    InvalidSignatureSet = 4003,

    // Internal errors (6xxx)
    Internal = 6002,
    Overflow = 6003,
}

/// Broad class of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed input; rejected synchronously with no state change.
    Validation,
    /// The call is valid but arrived at the wrong time or in the wrong order.
    StateOrdering,
    /// The caller is not allowed to perform the operation.
    Authorization,
    /// A bug or arithmetic limit inside Warden itself.
    Internal,
}

impl ErrorCode {
    /// Get the numeric code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Classify the code.
    ///
    /// Not-found codes count as state-ordering: the referenced round or
    /// period may simply not exist yet.
    pub fn class(self) -> ErrorClass {
        match self.code() {
            1000..=1999 => ErrorClass::Validation,
            2000..=3999 => ErrorClass::StateOrdering,
            4000..=4999 => ErrorClass::Authorization,
            _ => ErrorClass::Internal,
        }
    }

    /// Check if this is a caller error.
    pub fn is_client_error(self) -> bool {
        (1000..5000).contains(&self.code())
    }

    /// Check if the same call could succeed later without being changed.
    pub fn is_retryable_later(self) -> bool {
        self.class() == ErrorClass::StateOrdering
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Validation => write!(f, "validation"),
            ErrorClass::StateOrdering => write!(f, "state-ordering"),
            ErrorClass::Authorization => write!(f, "authorization"),
            ErrorClass::Internal => write!(f, "internal"),
        }
    }
}

/// Errors raised by the core types.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Invalid hash format or value.
    #[error("[{code}] invalid hash: {message}")]
    InvalidHash {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid cryptographic key.
    #[error("[{code}] invalid key: {message}")]
    InvalidKey {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Signature verification failed.
    #[error("[{code}] signature verification failed")]
    InvalidSignature { code: ErrorCode },

    /// Node record is malformed (zero id, zero wallet, mismatched key).
    #[error("[{code}] invalid node: {message}")]
    InvalidNode { code: ErrorCode, message: String },

    // ========================================================================
    // Lookup / conflict errors
    // ========================================================================
    /// Item not found.
    #[error("[{code}] not found: {message}")]
    NotFound { code: ErrorCode, message: String },

    /// Duplicate item.
    #[error("[{code}] duplicate: {message}")]
    Duplicate { code: ErrorCode, message: String },

    // ========================================================================
    // Internal Errors
    // ========================================================================
    /// Internal error.
    #[error("[{code}] internal error: {message}")]
    Internal { code: ErrorCode, message: String },
}

impl Error {
    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidHash { code, .. } => *code,
            Error::InvalidKey { code, .. } => *code,
            Error::InvalidSignature { code } => *code,
            Error::InvalidNode { code, .. } => *code,
            Error::NotFound { code, .. } => *code,
            Error::Duplicate { code, .. } => *code,
            Error::Internal { code, .. } => *code,
        }
    }

    /// Get the error class.
    pub fn class(&self) -> ErrorClass {
        self.code().class()
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(message: impl Into<String>) -> Self {
        Error::InvalidHash {
            code: ErrorCode::InvalidHash,
            message: message.into(),
            source: None,
        }
    }

    /// Create an InvalidKey error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Error::InvalidKey {
            code: ErrorCode::InvalidKey,
            message: message.into(),
            source: None,
        }
    }

    /// Create an InvalidSignature error.
    pub fn invalid_signature() -> Self {
        Error::InvalidSignature {
            code: ErrorCode::InvalidSignature,
        }
    }

    /// Create an InvalidNode error.
    pub fn invalid_node(message: impl Into<String>) -> Self {
        Error::InvalidNode {
            code: ErrorCode::InvalidNode,
            message: message.into(),
        }
    }

    /// Create a NotFound error for nodes.
    pub fn node_not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            code: ErrorCode::NodeNotFound,
            message: message.into(),
        }
    }

    /// Create a Duplicate error.
    pub fn duplicate(message: impl Into<String>) -> Self {
        Error::Duplicate {
            code: ErrorCode::Duplicate,
            message: message.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidHash {
            code: ErrorCode::InvalidHash,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}
