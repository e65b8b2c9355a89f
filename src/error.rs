//! Error types for the afterstate crate

use thiserror::Error;

use crate::tictactoe::Variant;

/// Main error type for the afterstate crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("illegal action {action} in state {state}")]
    IllegalAction { action: usize, state: String },

    #[error("code {code} is outside the {variant} codespace (must be below {codespace})")]
    InvalidCode {
        code: u32,
        codespace: u32,
        variant: Variant,
    },

    #[error("the standard variant has no pass flag")]
    PassNotSupported,

    #[error("board string too short: expected {expected} cells, got {got} in '{context}'")]
    InvalidBoardLength {
        expected: usize,
        got: usize,
        context: String,
    },

    #[error("invalid character '{character}' at position {position} in '{context}'")]
    InvalidCellCharacter {
        character: char,
        position: usize,
        context: String,
    },

    #[error("state {code} has no entry in the afterstate table")]
    UnknownState { code: u32 },

    #[error("action {action} is not recorded for state {code} in the afterstate table")]
    UnknownAction { code: u32, action: usize },

    #[error("no valid actions available")]
    NoValidActions,

    #[error("game ended on a board with no outcome: {state}")]
    UnresolvedOutcome { state: String },

    #[error("value table holds {found} entries but the afterstate table has {expected} afterstates")]
    ValueLengthMismatch { expected: usize, found: usize },

    #[error("value table was trained on table {found:#018x}, expected {expected:#018x}")]
    TableFingerprintMismatch { expected: u64, found: u64 },

    #[error("value table checksum {found:#018x} does not match {expected:#018x}")]
    ChecksumMismatch { expected: u64, found: u64 },

    #[error("malformed afterstate table: {message}")]
    InvalidTable { message: String },

    #[error("cached afterstate table is for the {found} variant, expected {expected}")]
    VariantMismatch { expected: Variant, found: Variant },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
