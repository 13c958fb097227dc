pub mod deployer;
pub mod error;
pub mod fetcher;
pub mod handover;
pub mod manager;

pub use deployer::{DeployDifferences, DeployOptions, Deployer, DeploymentData, DeploymentProperties};
pub use error::*;
pub use fetcher::{ContentFetcher, FileUrlFetcher, HttpFetcher};
pub use handover::{HandoverInfo, HandoverTarget};
pub use manager::{DeploymentManager, DeploymentUnit, InstallOptions};
