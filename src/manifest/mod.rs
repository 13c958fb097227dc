pub mod builder;
pub mod compliance;
pub mod error;
pub mod model;
pub mod ordered;
pub mod types;

pub use builder::DeploymentManifestBuilder;
pub use compliance::DestinationComplianceMode;
pub use error::*;
pub use model::{DeploymentManifest, PendingDownload, HANDOVER_DOWNLOAD_DIR};
pub use ordered::{OrderedMap, OrderedSet};
pub use types::*;
