use thiserror::Error;

/// Reasons an import document is rejected.
///
/// The messages are shown to the end user verbatim, so they are kept short and
/// distinguish the three failure families: bad syntax, wrong shape, missing fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid JSON format")]
    InvalidJson,

    #[error("Invalid JSON format: Expected an array of entities")]
    ExpectedArray,

    #[error("Missing required entity fields")]
    MissingEntityFields,

    #[error("Missing required attribute fields")]
    MissingAttributeFields,

    #[error("Invalid JSON format: ID {0} is out of range")]
    IdOutOfRange(i64),
}

#[derive(Error, Debug)]
pub enum EntreeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Please upload a JSON file")]
    InvalidFileType,

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EntreeError>;
