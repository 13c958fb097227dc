use crate::manifest::ManifestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Invalid JSON format: {reason}")]
    InvalidJson { reason: String },

    #[error("Invalid YAML format: {reason}")]
    InvalidYaml { reason: String },

    #[error("Recipe file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid recipe: {0}")]
    Manifest(#[from] ManifestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecipeError>;
