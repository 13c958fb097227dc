//! Incremental assembly of a deployment manifest

use super::compliance::DestinationComplianceMode;
use super::model::DeploymentManifest;
use super::types::{
    ArchiveDeclaration, ContentKind, FileDeclaration, FileSource, Handover, HandoverContent,
    SystemServiceDeclaration,
};
use super::{ManifestError, Result};
use crate::pattern::{FileSetSpec, PatternCompiler, PatternSyntax};
use crate::platform::{detect_platform, ServicePlatform};
use std::sync::Arc;
use tracing::debug;

/// Collects the declarations of one deployment unit.
///
/// Structural problems (a second system service or ignore element, an absolute
/// ignore directory, an unparsable pattern) are rejected as soon as the
/// offending declaration is added and leave the builder unchanged.
/// [`build`](Self::build) checks that there is something to deploy.
#[derive(Debug)]
pub struct DeploymentManifestBuilder {
    manifest: DeploymentManifest,
    compiler: PatternCompiler,
    platform: Arc<dyn ServicePlatform>,
    ignore_declared: bool,
}

impl DeploymentManifestBuilder {
    pub fn new(unit_name: impl Into<String>) -> Self {
        Self::with_platform(unit_name, detect_platform())
    }

    pub fn with_platform(unit_name: impl Into<String>, platform: Arc<dyn ServicePlatform>) -> Self {
        let manifest = DeploymentManifest {
            unit_name: unit_name.into(),
            ..DeploymentManifest::default()
        };

        Self {
            manifest,
            compiler: PatternCompiler::default(),
            platform,
            ignore_declared: false,
        }
    }

    pub fn pattern_syntax(mut self, syntax: PatternSyntax) -> Self {
        self.compiler = PatternCompiler::new(syntax);
        self
    }

    pub fn compliance(mut self, compliance: DestinationComplianceMode) -> Self {
        self.manifest.compliance = compliance;
        self
    }

    pub fn unit_name(&self) -> &str {
        &self.manifest.unit_name
    }

    pub fn system_service(&self) -> Option<&SystemServiceDeclaration> {
        self.manifest.system_service.as_ref()
    }

    /// Register a file; one carrying a handover goes to the handover list instead of the file mapping.
    pub fn add_file(&mut self, mut file: FileDeclaration) -> Result<&mut Self> {
        if let Some(handover) = file.handover.take() {
            if let (FileSource::Local(source), Some(name)) = (&file.source, file.name) {
                self.manifest.local_file_names.insert(source.clone(), name);
            }
            self.register_handover(file.source, ContentKind::File, handover);
            return Ok(self);
        }

        let destination = file.destination()?;
        debug!(
            unit = %self.manifest.unit_name,
            source = %file.source,
            destination = %destination.display(),
            replace = file.replace,
            "Registering {}", file.element()
        );

        match file.source {
            FileSource::Local(source) => {
                if let Some(name) = file.name {
                    self.manifest.local_file_names.insert(source.clone(), name);
                }
                if file.replace {
                    self.manifest.raw_files_to_replace.insert(source.clone());
                }
                self.manifest.files.insert(source, destination);
            }
            FileSource::Url(url) => {
                if file.replace {
                    self.manifest.raw_url_files_to_replace.insert(url.clone());
                }
                self.manifest.url_files.insert(url, destination);
            }
        }

        Ok(self)
    }

    pub fn add_archive(&mut self, mut archive: ArchiveDeclaration) -> Result<&mut Self> {
        let replace_pattern = self.compiler.compile(&archive.replace)?;

        if let Some(handover) = archive.handover.take() {
            if let (FileSource::Local(source), Some(name)) = (&archive.source, archive.name) {
                self.manifest.local_archive_names.insert(source.clone(), name);
            }
            self.register_handover(archive.source, ContentKind::Archive, handover);
            return Ok(self);
        }

        debug!(
            unit = %self.manifest.unit_name,
            source = %archive.source,
            exploded = archive.exploded,
            replace = replace_pattern.as_ref().map(|p| p.source()),
            "Registering archive"
        );

        match archive.source {
            FileSource::Local(source) => {
                if let Some(name) = archive.name {
                    self.manifest.local_archive_names.insert(source.clone(), name);
                }
                if let Some(pattern) = replace_pattern {
                    self.manifest
                        .archive_replace_patterns
                        .insert(source.clone(), pattern);
                }
                self.manifest
                    .archives_exploded
                    .insert(source.clone(), archive.exploded);
                self.manifest.archives.insert(source, archive.destination_dir);
            }
            FileSource::Url(url) => {
                if let Some(pattern) = replace_pattern {
                    self.manifest
                        .url_archive_replace_patterns
                        .insert(url.clone(), pattern);
                }
                self.manifest
                    .url_archives_exploded
                    .insert(url.clone(), archive.exploded);
                self.manifest.url_archives.insert(url, archive.destination_dir);
            }
        }

        Ok(self)
    }

    fn register_handover(&mut self, source: FileSource, kind: ContentKind, handover: Handover) {
        debug!(
            unit = %self.manifest.unit_name,
            source = %source,
            kind = ?kind,
            handover = %handover,
            "Registering content for handover"
        );
        self.manifest.contents_to_handover.push(HandoverContent {
            source,
            kind,
            handover,
        });
    }

    /// Register the unit's system service; its init script and config file join the file mapping.
    pub fn add_system_service(&mut self, service: SystemServiceDeclaration) -> Result<&mut Self> {
        if self.manifest.system_service.is_some() {
            return Err(ManifestError::DuplicateElement {
                unit: self.manifest.unit_name.clone(),
                element: "system-service",
            });
        }

        service.validate()?;

        let dirs = self
            .platform
            .service_dirs()
            .ok_or_else(|| ManifestError::UnsupportedPlatform {
                element: "system-service",
                platform: self.platform.name().to_string(),
            })?;

        let script_dest = service.destination_in(&dirs.init_dir);
        debug!(
            unit = %self.manifest.unit_name,
            service = %service.name,
            script = %service.script_file.display(),
            destination = %script_dest.display(),
            "Registering system service"
        );
        self.register_service_file(&service.script_file, script_dest);

        if let Some(config_file) = &service.config_file {
            let config_dest = service.destination_in(&dirs.config_dir);
            self.register_service_file(config_file, config_dest);
            self.manifest.raw_files_to_replace.insert(config_file.clone());
        }

        self.manifest.system_service = Some(service);
        Ok(self)
    }

    fn register_service_file(&mut self, source: &std::path::Path, destination: std::path::PathBuf) {
        if let Some(name) = source.file_name() {
            self.manifest
                .local_file_names
                .insert(source.to_path_buf(), name.to_string_lossy().into_owned());
        }
        self.manifest.files.insert(source.to_path_buf(), destination);
    }

    /// Compile the unit's ignore file-sets; directories must be relative to the deployment directory.
    pub fn add_ignore(&mut self, file_sets: &[FileSetSpec]) -> Result<&mut Self> {
        if self.ignore_declared {
            return Err(ManifestError::DuplicateElement {
                unit: self.manifest.unit_name.clone(),
                element: "ignore",
            });
        }

        if let Some(absolute) = file_sets.iter().find(|fs| fs.has_absolute_dir()) {
            return Err(ManifestError::AbsoluteIgnoreDir {
                dir: absolute
                    .dir()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_default(),
            });
        }

        let pattern = self.compiler.compile(file_sets)?;
        debug!(
            unit = %self.manifest.unit_name,
            pattern = pattern.as_ref().map(|p| p.source()),
            "Registering ignore pattern"
        );

        self.manifest.ignore_pattern = pattern;
        self.ignore_declared = true;
        Ok(self)
    }

    /// Finish the manifest; a unit with no files or archives is rejected.
    pub fn build(self) -> Result<DeploymentManifest> {
        if !self.manifest.has_content() {
            return Err(ManifestError::EmptyManifest {
                unit: self.manifest.unit_name,
            });
        }
        Ok(self.manifest)
    }
}
