use crate::deploy::{
    ContentFetcher, DeployDifferences, DeployError, DeployOptions, Deployer, DeploymentData,
    DeploymentProperties, HandoverInfo, HandoverTarget, Result,
};
use crate::manifest::{
    DeploymentManifest, FileSource, ManifestError, PendingDownload, HANDOVER_DOWNLOAD_DIR,
};
use crate::service::ServiceManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A built manifest together with the bundle it belongs to
#[derive(Debug, Clone)]
pub struct DeploymentUnit {
    pub properties: DeploymentProperties,
    pub manifest: DeploymentManifest,
    pub base_dir: PathBuf,
    pub deploy_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Restore the previous deployment instead of applying this one
    pub revert: bool,
    pub clean: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy)]
enum ServiceAction {
    Start,
    Stop,
    Disable,
}

impl ServiceAction {
    fn as_str(self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Disable => "disable",
        }
    }
}

/// Drives a deployment unit through download and deployment
pub struct DeploymentManager<D, F> {
    deployer: D,
    fetcher: F,
    service_manager: Option<Arc<dyn ServiceManager>>,
    handover_target: Option<Arc<dyn HandoverTarget>>,
}

impl<D, F> DeploymentManager<D, F>
where
    D: Deployer,
    F: ContentFetcher,
{
    pub fn new(deployer: D, fetcher: F) -> Self {
        Self {
            deployer,
            fetcher,
            service_manager: None,
            handover_target: None,
        }
    }

    /// Pass handover content to `target` once the deployer has finished.
    pub fn with_handover_target(mut self, target: Arc<dyn HandoverTarget>) -> Self {
        self.handover_target = Some(target);
        self
    }

    /// Register the unit's system service with the host after each deployment.
    pub fn with_service_manager(mut self, service_manager: Arc<dyn ServiceManager>) -> Self {
        self.service_manager = Some(service_manager);
        self
    }

    pub fn deployer(&self) -> &D {
        &self.deployer
    }

    pub async fn install(
        &self,
        unit: &DeploymentUnit,
        options: InstallOptions,
    ) -> Result<DeployDifferences> {
        if options.clean {
            info!(
                status = "INFO",
                action = "Clean Requested",
                "A clean deployment has been requested. Files will be deleted from the destination directory prior to the new deployment files getting written"
            );
        }
        if options.revert {
            info!(
                status = "INFO",
                action = "Revert Requested",
                "The previous deployment will be reverted. An attempt to restore backed up files and the old deployment content will be made"
            );
        }

        if !unit.manifest.has_content() {
            return Err(ManifestError::EmptyManifest {
                unit: unit.manifest.unit_name().to_string(),
            }
            .into());
        }

        info!(
            unit = unit.manifest.unit_name(),
            compliance = %unit.manifest.compliance(),
            "Destination compliance mode"
        );

        let (manifest, downloads) = unit.manifest.localize_urls(&unit.base_dir);
        let handover_dir = unit.base_dir.join(HANDOVER_DOWNLOAD_DIR);
        let result = self
            .download_and_deploy(unit, manifest, &downloads, options)
            .await;

        if downloads.iter().any(|download| download.path.starts_with(&handover_dir)) {
            purge_dir(&handover_dir).await;
        }

        result
    }

    async fn download_and_deploy(
        &self,
        unit: &DeploymentUnit,
        manifest: DeploymentManifest,
        downloads: &[PendingDownload],
        options: InstallOptions,
    ) -> Result<DeployDifferences> {
        let props = &unit.properties;
        self.download_all(downloads).await?;

        let data = DeploymentData {
            properties: props.clone(),
            base_dir: unit.base_dir.clone(),
            deploy_dir: unit.deploy_dir.clone(),
            compliance: manifest.compliance(),
            manifest,
        };

        if !options.dry_run {
            info!(status = "SUCCESS", action = "Deployer Started", "The deployer has started its work");
        }

        match self.deploy_and_handover(&data, options).await {
            Ok(diffs) => {
                if !options.dry_run {
                    info!(
                        status = "SUCCESS",
                        action = "Deployer Finished",
                        added = diffs.added.len(),
                        changed = diffs.changed.len(),
                        deleted = diffs.deleted.len(),
                        "The deployer has finished its work"
                    );
                    self.enable_service(&data.manifest).await?;
                }
                Ok(diffs)
            }
            Err(e) => {
                error!(
                    status = "FAILURE",
                    action = "Deployer Failed",
                    error = %e,
                    "The deployer encountered an error and could not finish"
                );
                Err(DeployError::DeploymentFailed {
                    bundle: props.bundle_name.clone(),
                    version: props.bundle_version.clone(),
                    source: Box::new(e),
                })
            }
        }
    }

    async fn deploy_and_handover(
        &self,
        data: &DeploymentData,
        options: InstallOptions,
    ) -> Result<DeployDifferences> {
        let deploy_options = DeployOptions {
            clean: options.clean,
            dry_run: options.dry_run,
        };

        let diffs = if options.revert {
            self.deployer
                .redeploy_and_restore_backup_files(data, deploy_options)
                .await?
        } else {
            self.deployer.deploy(data, deploy_options).await?
        };

        self.handover_all(&data.manifest, options).await?;
        Ok(diffs)
    }

    /// Offer each handover entry to the target; nothing is handed over on a dry run.
    async fn handover_all(
        &self,
        manifest: &DeploymentManifest,
        options: InstallOptions,
    ) -> Result<()> {
        let Some(target) = &self.handover_target else {
            return Ok(());
        };

        for content in manifest.contents_to_handover() {
            let FileSource::Local(path) = &content.source else {
                // localize_urls rewrote every URL source
                continue;
            };
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            if options.dry_run {
                debug!(
                    file = %filename,
                    handover = %content.handover,
                    "Dry run, skipping handover"
                );
                continue;
            }

            let info = HandoverInfo {
                content: path.clone(),
                filename: filename.clone(),
                kind: content.kind,
                action: content.handover.action.clone(),
                params: content.handover.params.clone(),
                revert: options.revert,
            };

            if target.handover_content(&info).await? {
                info!(
                    status = "INFO",
                    action = "Handover",
                    source = %filename,
                    handover = %content.handover,
                    "Handover target reported success"
                );
            } else if content.handover.fail_on_error {
                error!(
                    status = "FAILURE",
                    action = "Handover",
                    source = %filename,
                    handover = %content.handover,
                    "Handover target reported a failure"
                );
                return Err(DeployError::HandoverFailed {
                    filename,
                    handover: content.handover.to_string(),
                });
            } else {
                warn!(
                    status = "WARN",
                    action = "Handover",
                    source = %filename,
                    handover = %content.handover,
                    "Handover target reported a failure"
                );
            }
        }

        Ok(())
    }

    async fn enable_service(&self, manifest: &DeploymentManifest) -> Result<()> {
        let (Some(manager), Some(service)) = (&self.service_manager, manifest.system_service())
        else {
            return Ok(());
        };

        manager
            .enable_service(service)
            .await?
            .into_result(&service.name, "enable")?;
        info!(
            status = "SUCCESS",
            action = "Service Enabled",
            service = %service.name,
            levels = %service.start_levels,
            "The system service has been registered"
        );
        Ok(())
    }

    /// Start the unit's system service, if it declares one.
    pub async fn start(&self, unit: &DeploymentUnit) -> Result<()> {
        self.service_action(unit, ServiceAction::Start).await
    }

    /// Stop the unit's system service, if it declares one.
    pub async fn stop(&self, unit: &DeploymentUnit) -> Result<()> {
        self.service_action(unit, ServiceAction::Stop).await
    }

    /// Stop and deregister the unit's system service.
    pub async fn uninstall(&self, unit: &DeploymentUnit) -> Result<()> {
        self.service_action(unit, ServiceAction::Stop).await?;
        self.service_action(unit, ServiceAction::Disable).await
    }

    async fn service_action(&self, unit: &DeploymentUnit, action: ServiceAction) -> Result<()> {
        let (Some(manager), Some(service)) =
            (&self.service_manager, unit.manifest.system_service())
        else {
            debug!(
                unit = unit.manifest.unit_name(),
                action = action.as_str(),
                "No system service to manage"
            );
            return Ok(());
        };

        let result = match action {
            ServiceAction::Start => manager.start_service(&service.name).await?,
            ServiceAction::Stop => manager.stop_service(&service.name).await?,
            ServiceAction::Disable => manager.disable_service(&service.name).await?,
        };
        result.into_result(&service.name, action.as_str())?;
        info!(service = %service.name, action = action.as_str(), "System service updated");
        Ok(())
    }

    /// Fetch every pending download; on failure, files fetched so far are removed.
    async fn download_all(&self, downloads: &[PendingDownload]) -> Result<()> {
        let mut downloaded: Vec<&Path> = Vec::new();

        for download in downloads {
            info!(
                status = "SUCCESS",
                action = "File Download Started",
                url = %download.url,
                "Downloading file from URL"
            );

            match self.fetcher.fetch(&download.url, &download.path).await {
                Ok(size) => {
                    info!(
                        status = "SUCCESS",
                        action = "File Download Finished",
                        url = %download.url,
                        size,
                        "Successfully downloaded file from URL"
                    );
                    downloaded.push(&download.path);
                }
                Err(e) => {
                    error!(
                        status = "FAILURE",
                        action = "File Download Failed",
                        url = %download.url,
                        error = %e,
                        "Failed to download content from a remote server"
                    );
                    downloaded.push(&download.path);
                    for doomed in downloaded {
                        if let Err(remove_err) = tokio::fs::remove_file(doomed).await {
                            if remove_err.kind() != std::io::ErrorKind::NotFound {
                                warn!(path = %doomed.display(), "Could not remove downloaded file: {remove_err}");
                            }
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

async fn purge_dir(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %dir.display(), "Could not remove download directory: {e}");
        }
    }
}
