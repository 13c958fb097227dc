use crate::pattern::PatternError;
use thiserror::Error;

/// Configuration errors raised while assembling a deployment unit
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("A deployment unit can only have one {element} child element (unit '{unit}')")]
    DuplicateElement { unit: String, element: &'static str },

    #[error("The dir attribute of an ignore file-set must be relative to the deployment directory: {dir}")]
    AbsoluteIgnoreDir { dir: String },

    #[error("Deployment unit '{unit}' must declare at least one file to deploy via nested file, archive, url-file or url-archive elements")]
    EmptyManifest { unit: String },

    #[error("The {element} element cannot specify both {first} and {second}")]
    ConflictingAttributes {
        element: &'static str,
        first: &'static str,
        second: &'static str,
    },

    #[error("Invalid {element} {attribute} '{value}': {reason}")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot determine a file name for {element} source: {source_path}")]
    UnnamedSource {
        element: &'static str,
        source_path: String,
    },

    #[error("The {element} element is not supported on platform '{platform}'")]
    UnsupportedPlatform {
        element: &'static str,
        platform: String,
    },

    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
