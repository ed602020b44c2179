use thiserror::Error;

pub type Result<T> = std::result::Result<T, SbfError>;

#[derive(Error, Debug)]
pub enum SbfError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to gather randomness for salt generation: {0}")]
    RandomnessFailure(String),

    #[error("Salt file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Salt file too short: expected {expected} salts, found {found} lines"
    )]
    SaltFileTooShort { expected: usize, found: usize },

    #[error(
        "Malformed salt on line {line}: decoded {found} bytes, expected {expected}"
    )]
    SaltLengthMismatch {
        line: usize,
        found: usize,
        expected: usize,
    },

    #[error("Malformed salt on line {line}: {source}")]
    SaltDecode {
        line: usize,
        source: base64::DecodeError,
    },

    #[error("Area label {label} out of range [1, {max}]")]
    AreaLabelOutOfRange { label: u32, max: u16 },

    #[error("Element is {size} bytes, maximum input size is {max}")]
    ElementTooLong { size: usize, max: usize },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
