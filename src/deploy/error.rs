use crate::manifest::ManifestError;
use crate::service::ServiceManagerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ManifestError),

    #[error("Failed to download file from {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Failed to deploy bundle [{bundle}] version [{version}]: {source}")]
    DeploymentFailed {
        bundle: String,
        version: String,
        #[source]
        source: Box<DeployError>,
    },

    #[error("Handover failed for {filename}: {handover}")]
    HandoverFailed { filename: String, handover: String },

    #[error("Deployer error: {0}")]
    Deployer(String),

    #[error("Service error: {0}")]
    Service(#[from] ServiceManagerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeployError>;
