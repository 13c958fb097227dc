//! Deployment-unit recipes
//!
//! A recipe is the YAML or JSON description of one deployment unit. Local
//! `name` attributes are paths inside the bundle distribution and are resolved
//! against the distribution's base directory.

pub mod error;
pub mod parser;

pub use error::*;
pub use parser::{RecipeFormat, RecipeParser};

use crate::manifest::{
    ArchiveDeclaration, DeploymentManifest, DeploymentManifestBuilder, DestinationComplianceMode,
    FileDeclaration, Handover, SystemServiceDeclaration,
};
use crate::pattern::{FileSetSpec, PatternSyntax};
use crate::platform::ServicePlatform;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub compliance: Option<DestinationComplianceMode>,
    /// Deprecated predecessor of `compliance`
    #[serde(default)]
    pub manage_root_dir: Option<FlagValue>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub url_files: Vec<UrlFileEntry>,
    #[serde(default)]
    pub archives: Vec<ArchiveEntry>,
    #[serde(default)]
    pub url_archives: Vec<UrlArchiveEntry>,
    #[serde(default)]
    pub system_service: Option<SystemServiceEntry>,
    #[serde(default)]
    pub ignore: Option<Vec<FileSetSpec>>,
    /// Overrides the syntax the caller would otherwise compile globs with
    #[serde(default)]
    pub pattern_syntax: Option<PatternSyntax>,
}

/// A boolean attribute that may also be written as a string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

impl FlagValue {
    pub fn as_text(&self) -> String {
        match self {
            FlagValue::Bool(value) => value.to_string(),
            FlagValue::Text(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub destination_file: Option<PathBuf>,
    #[serde(default)]
    pub destination_dir: Option<PathBuf>,
    #[serde(default)]
    pub replace: bool,
    #[serde(default)]
    pub handover: Option<Handover>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UrlFileEntry {
    pub url: Url,
    #[serde(default)]
    pub destination_file: Option<PathBuf>,
    #[serde(default)]
    pub destination_dir: Option<PathBuf>,
    #[serde(default)]
    pub replace: bool,
    #[serde(default)]
    pub handover: Option<Handover>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArchiveEntry {
    pub name: String,
    #[serde(default)]
    pub destination_dir: Option<PathBuf>,
    #[serde(default)]
    pub exploded: bool,
    #[serde(default)]
    pub replace: Vec<FileSetSpec>,
    #[serde(default)]
    pub handover: Option<Handover>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UrlArchiveEntry {
    pub url: Url,
    #[serde(default)]
    pub destination_dir: Option<PathBuf>,
    #[serde(default)]
    pub exploded: bool,
    #[serde(default)]
    pub replace: Vec<FileSetSpec>,
    #[serde(default)]
    pub handover: Option<Handover>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SystemServiceEntry {
    pub name: String,
    pub script_file: String,
    #[serde(default)]
    pub config_file: Option<String>,
    #[serde(default)]
    pub start_levels: Option<String>,
    #[serde(default)]
    pub start_priority: Option<u8>,
    #[serde(default)]
    pub stop_priority: Option<u8>,
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl Recipe {
    pub fn resolve_compliance(&self) -> Result<DestinationComplianceMode> {
        match (&self.compliance, &self.manage_root_dir) {
            (Some(compliance), Some(flag)) => {
                DestinationComplianceMode::from_manage_root_dir(&flag.as_text())?;
                warn!(
                    unit = %self.name,
                    "Both 'compliance' and the deprecated 'manageRootDir' are set; using compliance={compliance}"
                );
                Ok(*compliance)
            }
            (Some(compliance), None) => Ok(*compliance),
            (None, Some(flag)) => Ok(DestinationComplianceMode::from_manage_root_dir(
                &flag.as_text(),
            )?),
            (None, None) => Ok(DestinationComplianceMode::default()),
        }
    }

    /// Register every declaration of the recipe on a fresh builder.
    ///
    /// Globs use the recipe's `patternSyntax` when it declares one, else `default_syntax`.
    pub fn to_builder(
        &self,
        base_dir: &Path,
        platform: Arc<dyn ServicePlatform>,
        default_syntax: PatternSyntax,
    ) -> Result<DeploymentManifestBuilder> {
        let mut builder = DeploymentManifestBuilder::with_platform(self.name.clone(), platform)
            .pattern_syntax(self.pattern_syntax.unwrap_or(default_syntax))
            .compliance(self.resolve_compliance()?);

        for file in &self.files {
            builder.add_file(FileDeclaration {
                destination_file: file.destination_file.clone(),
                destination_dir: file.destination_dir.clone(),
                replace: file.replace,
                handover: file.handover.clone(),
                ..FileDeclaration::local(base_dir.join(&file.name)).named(file.name.clone())
            })?;
        }

        for file in &self.url_files {
            builder.add_file(FileDeclaration {
                destination_file: file.destination_file.clone(),
                destination_dir: file.destination_dir.clone(),
                replace: file.replace,
                handover: file.handover.clone(),
                ..FileDeclaration::url(file.url.clone())
            })?;
        }

        for archive in &self.archives {
            builder.add_archive(ArchiveDeclaration {
                destination_dir: archive.destination_dir.clone(),
                exploded: archive.exploded,
                replace: archive.replace.clone(),
                handover: archive.handover.clone(),
                ..ArchiveDeclaration::local(base_dir.join(&archive.name)).named(archive.name.clone())
            })?;
        }

        for archive in &self.url_archives {
            builder.add_archive(ArchiveDeclaration {
                destination_dir: archive.destination_dir.clone(),
                exploded: archive.exploded,
                replace: archive.replace.clone(),
                handover: archive.handover.clone(),
                ..ArchiveDeclaration::url(archive.url.clone())
            })?;
        }

        if let Some(service) = &self.system_service {
            builder.add_system_service(service.to_declaration(base_dir))?;
        }

        if let Some(ignore) = &self.ignore {
            builder.add_ignore(ignore)?;
        }

        Ok(builder)
    }

    pub fn build_manifest(
        &self,
        base_dir: &Path,
        platform: Arc<dyn ServicePlatform>,
        default_syntax: PatternSyntax,
    ) -> Result<DeploymentManifest> {
        Ok(self.to_builder(base_dir, platform, default_syntax)?.build()?)
    }
}

impl SystemServiceEntry {
    fn to_declaration(&self, base_dir: &Path) -> SystemServiceDeclaration {
        let mut service =
            SystemServiceDeclaration::new(self.name.clone(), base_dir.join(&self.script_file));
        if let Some(config_file) = &self.config_file {
            service = service.with_config_file(base_dir.join(config_file));
        }
        if let Some(levels) = &self.start_levels {
            service.start_levels = levels.clone();
        }
        if let Some(priority) = self.start_priority {
            service.start_priority = priority;
        }
        if let Some(priority) = self.stop_priority {
            service.stop_priority = priority;
        }
        if let Some(root) = &self.root {
            service = service.with_root(root.clone());
        }
        service
    }
}
