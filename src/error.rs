//! Error types for the school console
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO / local storage errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    StorageUnavailable = 210,
    SeedNotFound = 211,
    SeedCorrupted = 212,

    // Remote read errors (3xx)
    FetchFailed = 300,
    FetchTimeout = 301,
    MalformedResponse = 302,

    // Transition errors (4xx)
    TransitionFailed = 400,

    // Session errors (5xx)
    Unauthenticated = 500,
    PermissionDenied = 501,
    NoSchoolAffiliation = 502,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO / storage errors
            300..=399 => 30, // Remote read errors
            400..=499 => 40, // Transition errors
            500..=599 => 50, // Session errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the console
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO / Local Storage Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// The local key-value cache cannot be used at all
    #[error("Local storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// A seed-store key has no value yet. Healed by seeding, never surfaced.
    #[error("No collection stored under '{key}'")]
    NotFound { key: String },

    /// A stored collection exists but cannot be decoded
    #[error("Stored collection '{key}' is corrupted: {message}")]
    SeedCorrupted { key: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Remote Errors
    // ─────────────────────────────────────────────────────────────

    /// Transport or server error on a read
    #[error("Failed to fetch {resource}: {message}")]
    FetchFailed { resource: String, message: String },

    /// Read timed out
    #[error("Fetching {resource} timed out after {timeout_secs}s")]
    FetchTimeout { resource: String, timeout_secs: u64 },

    /// Response body did not have the expected shape
    #[error("Malformed response for {resource}: {message}")]
    MalformedResponse { resource: String, message: String },

    /// Activation change rejected or not confirmed by the server
    #[error("Could not {action} school {school_id}: {message}")]
    TransitionFailed {
        school_id: String,
        action: &'static str,
        message: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────

    /// No current user
    #[error("No user is signed in")]
    Unauthenticated,

    /// Current role cannot perform the operation
    #[error("Role {role} is not permitted to {action}")]
    PermissionDenied { role: String, action: String },

    /// The operation needs the user's school, and none is known
    #[error("{role} user has no school affiliation")]
    NoSchoolAffiliation { role: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(_) => ErrorCode::IoRead,
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::StorageUnavailable { .. } => ErrorCode::StorageUnavailable,
            Error::NotFound { .. } => ErrorCode::SeedNotFound,
            Error::SeedCorrupted { .. } => ErrorCode::SeedCorrupted,

            Error::FetchFailed { .. } => ErrorCode::FetchFailed,
            Error::FetchTimeout { .. } => ErrorCode::FetchTimeout,
            Error::MalformedResponse { .. } => ErrorCode::MalformedResponse,

            Error::TransitionFailed { .. } => ErrorCode::TransitionFailed,

            Error::Unauthenticated => ErrorCode::Unauthenticated,
            Error::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            Error::NoSchoolAffiliation { .. } => ErrorCode::NoSchoolAffiliation,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is a failed read the caller may retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::FetchFailed { .. } | Error::FetchTimeout { .. }
        )
    }

    /// Check if the error is fatal (the host environment is unsupported)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::StorageUnavailable { .. }
                | Error::Internal(_)
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'school-console config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'school-console config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::StorageUnavailable { .. } => Some(
                "Check that the data directory exists and is writable, or set SCHOOL_CONSOLE_DATA_DIR."
            ),
            Error::SeedCorrupted { .. } => Some(
                "Delete the local seed file to restore the default collection."
            ),
            Error::FetchFailed { .. } | Error::FetchTimeout { .. } => Some(
                "Check the API base URL and your network connection, then retry."
            ),
            Error::TransitionFailed { .. } => Some(
                "The school's status was not changed. Confirm the action again to retry."
            ),
            Error::Unauthenticated => Some(
                "Set [session] role in the configuration or pass --role."
            ),
            Error::PermissionDenied { .. } => Some(
                "Only a Super Admin can activate or deactivate schools."
            ),
            Error::NoSchoolAffiliation { .. } => Some(
                "Set [session] school_id in the configuration or pass --school-id."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a fetch failed error
    pub fn fetch_failed(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Error::FetchFailed {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedResponse {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a transition failed error
    pub fn transition_failed(
        school_id: impl Into<String>,
        action: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Error::TransitionFailed {
            school_id: school_id.into(),
            action,
            message: message.into(),
        }
    }

    /// Create a storage unavailable error
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Error::StorageUnavailable {
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
