use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid file-set pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, PatternError>;
