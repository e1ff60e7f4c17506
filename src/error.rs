//! Error handling for n3graph
//!
//! Provides a single error enum for the library with:
//! - Error codes for programmatic handling
//! - Category predicates used to decide whether a failure is row-scoped
//!
//! # Error Categories
//!
//! - Encoding errors - malformed graph text
//! - Store errors - invalid triples, self-merges
//! - Namespace errors - undefined prefixes
//! - Update errors - template construction and graph specifiers
//! - Config errors - configuration files
//!
//! # Example
//!
//! ```rust,ignore
//! use n3graph::{Error, ErrorCode};
//!
//! let err = Error::NamespaceResolution { prefix: "ex".into() };
//! assert_eq!(err.code(), ErrorCode::UndefinedPrefix);
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Encoding errors (1xxx)
    /// Generic encoding error
    EncodingError = 1000,
    /// Unsupported encoding version
    UnsupportedVersion = 1001,
    /// A required structural element is missing
    MissingElement = 1002,
    /// Invalid node syntax
    InvalidNodeSyntax = 1003,

    // Store errors (3xxx)
    /// Generic store error
    StoreError = 3000,
    /// Node not allowed in a triple position
    InvalidTriple = 3001,
    /// A graph was merged into itself
    SelfMerge = 3002,

    // Namespace errors (4xxx)
    /// Prefix is not defined in the namespace map
    UndefinedPrefix = 4000,

    // Update errors (5xxx)
    /// Generic update error
    UpdateError = 5000,
    /// Template variable had no binding
    UnboundVariable = 5001,
    /// Blank node used in a DELETE template
    BlankNodeInDelete = 5002,
    /// Graph specifier is neither a URI nor a variable
    UnsupportedGraphSpecifier = 5003,
    /// The algebra evaluator failed
    EvaluationFailed = 5004,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Invalid config syntax
    InvalidConfigSyntax = 7001,

    // Internal errors (9xxx)
    /// I/O failure
    IoError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::EncodingError => "Encoding error",
            ErrorCode::UnsupportedVersion => "Unsupported encoding version",
            ErrorCode::MissingElement => "Missing structural element",
            ErrorCode::InvalidNodeSyntax => "Invalid node syntax",

            ErrorCode::StoreError => "Store error",
            ErrorCode::InvalidTriple => "Invalid triple",
            ErrorCode::SelfMerge => "Graph merged into itself",

            ErrorCode::UndefinedPrefix => "Undefined namespace prefix",

            ErrorCode::UpdateError => "Update error",
            ErrorCode::UnboundVariable => "Unbound template variable",
            ErrorCode::BlankNodeInDelete => "Blank node in DELETE template",
            ErrorCode::UnsupportedGraphSpecifier => "Unsupported graph specifier",
            ErrorCode::EvaluationFailed => "WHERE evaluation failed",

            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::InvalidConfigSyntax => "Invalid config syntax",

            ErrorCode::IoError => "I/O error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}: {}", self.code(), self.description())
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Position of a node within a triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Subject,
    Predicate,
    Object,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Subject => write!(f, "subject"),
            Position::Predicate => write!(f, "predicate"),
            Position::Object => write!(f, "object"),
        }
    }
}

/// Errors raised by the graph store and update engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A node kind is not allowed in a triple position
    #[error("{node} is not allowed in {position} position")]
    InvalidTriple { position: Position, node: String },

    /// `Merge` was asked to merge a graph into itself
    #[error("cannot merge a graph into itself")]
    SelfMerge,

    /// Prefixed name uses an undefined prefix
    #[error("namespace prefix '{prefix}:' is not defined")]
    NamespaceResolution { prefix: String },

    /// Prefixed name is not syntactically valid
    #[error("invalid prefixed name '{0}'")]
    InvalidPrefixedName(String),

    /// Template variable had no binding in a solution row
    #[error("variable ?{0} is unbound")]
    UnboundVariable(String),

    /// Blank nodes are not allowed in DELETE templates
    #[error("blank node {0} is not allowed in a DELETE template")]
    BlankNodeInDeleteTemplate(String),

    /// Graph specifier is neither a fixed URI nor a variable
    #[error("unsupported graph specifier {0}")]
    UnsupportedGraphSpecifier(String),

    /// The algebra evaluator failed
    #[error("WHERE evaluation failed: {0}")]
    Evaluation(String),

    /// Graph text is missing an expected structural element
    #[error("malformed graph text at line {line}: missing {missing}")]
    MalformedEncoding { missing: String, line: usize },

    /// Graph text declares a version this build does not read
    #[error("unsupported graph text version '{0}'")]
    UnsupportedVersion(String),

    /// A node token could not be read
    #[error("invalid node syntax at line {line}: {message}")]
    InvalidNodeSyntax { message: String, line: usize },

    /// Configuration could not be read or parsed
    #[error("config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidTriple { .. } => ErrorCode::InvalidTriple,
            Error::SelfMerge => ErrorCode::SelfMerge,
            Error::NamespaceResolution { .. } => ErrorCode::UndefinedPrefix,
            Error::InvalidPrefixedName(_) => ErrorCode::InvalidNodeSyntax,
            Error::UnboundVariable(_) => ErrorCode::UnboundVariable,
            Error::BlankNodeInDeleteTemplate(_) => ErrorCode::BlankNodeInDelete,
            Error::UnsupportedGraphSpecifier(_) => ErrorCode::UnsupportedGraphSpecifier,
            Error::Evaluation(_) => ErrorCode::EvaluationFailed,
            Error::MalformedEncoding { .. } => ErrorCode::MissingElement,
            Error::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            Error::InvalidNodeSyntax { .. } => ErrorCode::InvalidNodeSyntax,
            Error::Config { .. } => ErrorCode::ConfigError,
            Error::Io(_) => ErrorCode::IoError,
        }
    }

    /// Whether this error only affects one solution row of an update
    ///
    /// Row-scoped errors are logged and the row's contribution is dropped;
    /// everything else aborts the command.
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            Error::InvalidTriple { .. }
                | Error::UnboundVariable(_)
                | Error::BlankNodeInDeleteTemplate(_)
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::SelfMerge.code(), 3002);
        assert_eq!(ErrorCode::UndefinedPrefix.code(), 4000);
        assert_eq!(
            format!("{}", ErrorCode::MissingElement),
            "E1002: Missing structural element"
        );
    }

    #[test]
    fn test_error_code_mapping() {
        let err = Error::NamespaceResolution { prefix: "ex".into() };
        assert_eq!(err.code(), ErrorCode::UndefinedPrefix);
        assert_eq!(err.to_string(), "namespace prefix 'ex:' is not defined");

        let err = Error::MalformedEncoding { missing: "header".into(), line: 1 };
        assert_eq!(err.code(), ErrorCode::MissingElement);
    }

    #[test]
    fn test_row_scoped() {
        assert!(Error::UnboundVariable("x".into()).is_row_scoped());
        assert!(Error::InvalidTriple {
            position: Position::Subject,
            node: "\"lit\"".into()
        }
        .is_row_scoped());
        assert!(!Error::SelfMerge.is_row_scoped());
        assert!(!Error::UnsupportedGraphSpecifier("\"g\"".into()).is_row_scoped());
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::SelfMerge).unwrap();
        assert_eq!(json, "\"SELF_MERGE\"");
    }
}
