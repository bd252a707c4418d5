use sone_core_types::InsertId;
use thiserror::Error;

/// Result type alias using SoneError
pub type Result<T> = std::result::Result<T, SoneError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, log assertions and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    InvalidUri,
    NotFound,
    AlreadyExists,

    // Publishing
    InsertionFailed,

    // Integration/IO
    Io,
    Serialization,
    Configuration,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidUri => "ERR_INVALID_URI",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::InsertionFailed => "ERR_INSERTION_FAILED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling plus the
/// context (operation, Sone, insert attempt) needed to read a log line
/// on its own.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    sone_id: Option<String>,
    insert_id: Option<InsertId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            sone_id: None,
            insert_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add Sone ID context
    pub fn with_sone_id(mut self, id: impl Into<String>) -> Self {
        self.sone_id = Some(id.into());
        self
    }

    /// Add insert attempt context
    pub fn with_insert_id(mut self, insert_id: InsertId) -> Self {
        self.insert_id = Some(insert_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn sone_id(&self) -> Option<&str> {
        self.sone_id.as_deref()
    }

    pub fn insert_id(&self) -> Option<&InsertId> {
        self.insert_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(sone_id) = &self.sone_id {
            write!(f, " (sone_id: {})", sone_id)?;
        }
        if let Some(insert_id) = &self.insert_id {
            write!(f, " (insert_id: {})", insert_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for Sone operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SoneError {
    /// The network layer could not publish the manifest
    #[error("Insertion failed: {reason}")]
    InsertionFailed { reason: String },

    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Sone not found: {sone_id}")]
    SoneNotFound { sone_id: String },

    /// An inserter is already running for this Sone
    #[error("Sone is already tracked: {sone_id}")]
    SoneAlreadyTracked { sone_id: String },

    #[error("Unknown option: {name}")]
    UnknownOption { name: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    /// A thread panicked while holding a lock
    #[error("Lock poisoned: {what}")]
    LockPoisoned { what: String },

    #[error("Inserter worker for Sone {sone_id} panicked")]
    WorkerPanicked { sone_id: String },
}

impl From<SoneError> for ExError {
    fn from(err: SoneError) -> Self {
        match err {
            SoneError::InsertionFailed { reason } => {
                ExError::new(ExErrorKind::InsertionFailed).with_message(reason)
            }

            SoneError::InvalidUri { uri, reason } => ExError::new(ExErrorKind::InvalidUri)
                .with_op("parse_uri")
                .with_message(format!("{}: {}", uri, reason)),

            SoneError::SoneNotFound { sone_id } => ExError::new(ExErrorKind::NotFound)
                .with_sone_id(sone_id)
                .with_message("Sone not found"),

            SoneError::SoneAlreadyTracked { sone_id } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_sone_id(sone_id)
                    .with_message("Sone already has an inserter")
            }

            SoneError::UnknownOption { name } => ExError::new(ExErrorKind::NotFound)
                .with_op("option_lookup")
                .with_message(format!("Unknown option: {}", name)),

            SoneError::Configuration { message } => {
                ExError::new(ExErrorKind::Configuration).with_message(message)
            }

            SoneError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            SoneError::Io { message } => ExError::new(ExErrorKind::Io).with_message(message),

            SoneError::LockPoisoned { what } => ExError::new(ExErrorKind::Concurrency)
                .with_message(format!("Lock poisoned: {}", what)),

            SoneError::WorkerPanicked { sone_id } => ExError::new(ExErrorKind::Internal)
                .with_op("stop_inserter")
                .with_sone_id(sone_id)
                .with_message("Inserter worker panicked"),
        }
    }
}

impl From<serde_json::Error> for SoneError {
    fn from(err: serde_json::Error) -> Self {
        SoneError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for SoneError {
    fn from(err: config::ConfigError) -> Self {
        SoneError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SoneError {
    fn from(err: std::io::Error) -> Self {
        SoneError::Io {
            message: err.to_string(),
        }
    }
}
