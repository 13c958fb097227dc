//! The deployer seam: whatever lays files down on disk

use crate::deploy::Result;
use crate::manifest::{DeploymentManifest, DestinationComplianceMode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity of the bundle deployment being performed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProperties {
    pub deployment_id: u64,
    pub bundle_name: String,
    pub bundle_version: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A manifest with only local sources, ready for a deployer
#[derive(Debug, Clone)]
pub struct DeploymentData {
    pub properties: DeploymentProperties,
    /// Directory the bundle distribution was unpacked into
    pub base_dir: PathBuf,
    /// Destination directory of the deployment
    pub deploy_dir: PathBuf,
    pub compliance: DestinationComplianceMode,
    pub manifest: DeploymentManifest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Wipe the destination directory before laying down new content
    pub clean: bool,
    /// Compute differences without touching the filesystem
    pub dry_run: bool,
}

/// What a deployment changed, as reported by the deployer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployDifferences {
    pub added: Vec<PathBuf>,
    pub changed: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub ignored: Vec<PathBuf>,
    pub backed_up: Vec<PathBuf>,
    pub restored: Vec<PathBuf>,
    pub realized: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl DeployDifferences {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.changed.is_empty()
            && self.deleted.is_empty()
            && self.ignored.is_empty()
            && self.backed_up.is_empty()
            && self.restored.is_empty()
            && self.realized.is_empty()
            && self.errors.is_empty()
    }
}

#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(&self, data: &DeploymentData, options: DeployOptions) -> Result<DeployDifferences>;

    /// Redeploy the previous content and put backed-up files back in place.
    async fn redeploy_and_restore_backup_files(
        &self,
        data: &DeploymentData,
        options: DeployOptions,
    ) -> Result<DeployDifferences>;
}
