//! The assembled deployment manifest handed to a deployer

use super::compliance::DestinationComplianceMode;
use super::ordered::{OrderedMap, OrderedSet};
use super::types::{url_base_name, FileSource, HandoverContent, SystemServiceDeclaration};
use crate::pattern::CompiledPattern;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Everything a deployer needs to lay down one deployment unit.
///
/// File destinations may be relative (to the deployment directory) or absolute.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentManifest {
    pub(crate) unit_name: String,
    pub(crate) compliance: DestinationComplianceMode,

    pub(crate) files: OrderedMap<PathBuf, PathBuf>,
    pub(crate) raw_files_to_replace: OrderedSet<PathBuf>,
    pub(crate) local_file_names: OrderedMap<PathBuf, String>,

    pub(crate) archives: OrderedMap<PathBuf, Option<PathBuf>>,
    pub(crate) archive_replace_patterns: OrderedMap<PathBuf, CompiledPattern>,
    pub(crate) archives_exploded: OrderedMap<PathBuf, bool>,
    pub(crate) local_archive_names: OrderedMap<PathBuf, String>,

    pub(crate) url_files: OrderedMap<Url, PathBuf>,
    pub(crate) raw_url_files_to_replace: OrderedSet<Url>,

    pub(crate) url_archives: OrderedMap<Url, Option<PathBuf>>,
    pub(crate) url_archive_replace_patterns: OrderedMap<Url, CompiledPattern>,
    pub(crate) url_archives_exploded: OrderedMap<Url, bool>,

    pub(crate) ignore_pattern: Option<CompiledPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) system_service: Option<SystemServiceDeclaration>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) contents_to_handover: Vec<HandoverContent>,
}

/// Directory under the download dir that receives URL content bound for handover
pub const HANDOVER_DOWNLOAD_DIR: &str = ".handover-download";

/// URL content that must be fetched to `path` before deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDownload {
    pub url: Url,
    pub path: PathBuf,
}

impl DeploymentManifest {
    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn compliance(&self) -> DestinationComplianceMode {
        self.compliance
    }

    /// Source file to destination file, in declaration order
    pub fn files(&self) -> &OrderedMap<PathBuf, PathBuf> {
        &self.files
    }

    pub fn raw_files_to_replace(&self) -> &OrderedSet<PathBuf> {
        &self.raw_files_to_replace
    }

    /// Source file to its path inside the bundle distribution
    pub fn local_file_names(&self) -> &OrderedMap<PathBuf, String> {
        &self.local_file_names
    }

    /// Archive to destination directory (`None` is the deployment directory)
    pub fn archives(&self) -> &OrderedMap<PathBuf, Option<PathBuf>> {
        &self.archives
    }

    pub fn archive_replace_patterns(&self) -> &OrderedMap<PathBuf, CompiledPattern> {
        &self.archive_replace_patterns
    }

    pub fn archives_exploded(&self) -> &OrderedMap<PathBuf, bool> {
        &self.archives_exploded
    }

    pub fn local_archive_names(&self) -> &OrderedMap<PathBuf, String> {
        &self.local_archive_names
    }

    /// Archives stay compressed unless declared exploded.
    pub fn is_exploded(&self, archive: &Path) -> bool {
        self.archives_exploded.get(archive).copied().unwrap_or(false)
    }

    pub fn url_files(&self) -> &OrderedMap<Url, PathBuf> {
        &self.url_files
    }

    pub fn raw_url_files_to_replace(&self) -> &OrderedSet<Url> {
        &self.raw_url_files_to_replace
    }

    pub fn url_archives(&self) -> &OrderedMap<Url, Option<PathBuf>> {
        &self.url_archives
    }

    pub fn url_archive_replace_patterns(&self) -> &OrderedMap<Url, CompiledPattern> {
        &self.url_archive_replace_patterns
    }

    pub fn url_archives_exploded(&self) -> &OrderedMap<Url, bool> {
        &self.url_archives_exploded
    }

    pub fn ignore_pattern(&self) -> Option<&CompiledPattern> {
        self.ignore_pattern.as_ref()
    }

    /// The service whose init script is part of [`files`](Self::files)
    pub fn system_service(&self) -> Option<&SystemServiceDeclaration> {
        self.system_service.as_ref()
    }

    /// Files and archives handed to the handover target, in declaration order
    pub fn contents_to_handover(&self) -> &[HandoverContent] {
        &self.contents_to_handover
    }

    /// True when a relative path under the deployment directory is left alone.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.ignore_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(relative_path))
    }

    pub fn has_content(&self) -> bool {
        !self.files.is_empty()
            || !self.archives.is_empty()
            || !self.url_files.is_empty()
            || !self.url_archives.is_empty()
            || !self.contents_to_handover.is_empty()
    }

    pub fn has_url_content(&self) -> bool {
        !self.url_files.is_empty()
            || !self.url_archives.is_empty()
            || self
                .contents_to_handover
                .iter()
                .any(|content| matches!(content.source, FileSource::Url(_)))
    }

    /// Rewrite URL-sourced entries as local files under `download_dir`.
    ///
    /// URL files land at `download_dir/<destination path>` so two files sharing a
    /// name do not collide; URL archives land at `download_dir/<url base name>`.
    /// Replace flags, replace patterns and exploded flags follow their entries.
    /// URL content bound for handover lands in `download_dir/.handover-download`.
    pub fn localize_urls(&self, download_dir: &Path) -> (DeploymentManifest, Vec<PendingDownload>) {
        let mut localized = self.clone();
        localized.url_files = OrderedMap::new();
        localized.raw_url_files_to_replace = OrderedSet::new();
        localized.url_archives = OrderedMap::new();
        localized.url_archive_replace_patterns = OrderedMap::new();
        localized.url_archives_exploded = OrderedMap::new();

        let mut downloads = Vec::new();

        for (url, destination) in self.url_files.iter() {
            let path = download_dir.join(relative_to_root(destination));
            localized.files.insert(path.clone(), destination.clone());
            if self.raw_url_files_to_replace.contains(url) {
                localized.raw_files_to_replace.insert(path.clone());
            }
            downloads.push(PendingDownload {
                url: url.clone(),
                path,
            });
        }

        for (url, destination_dir) in self.url_archives.iter() {
            let path = download_dir.join(url_base_name(url));
            localized.archives.insert(path.clone(), destination_dir.clone());
            if let Some(pattern) = self.url_archive_replace_patterns.get(url) {
                localized
                    .archive_replace_patterns
                    .insert(path.clone(), pattern.clone());
            }
            if let Some(exploded) = self.url_archives_exploded.get(url) {
                localized.archives_exploded.insert(path.clone(), *exploded);
            }
            downloads.push(PendingDownload {
                url: url.clone(),
                path,
            });
        }

        let handover_dir = download_dir.join(HANDOVER_DOWNLOAD_DIR);
        for content in localized.contents_to_handover.iter_mut() {
            if let FileSource::Url(url) = &content.source {
                let path = handover_dir.join(url_base_name(url));
                downloads.push(PendingDownload {
                    url: url.clone(),
                    path: path.clone(),
                });
                content.source = FileSource::Local(path);
            }
        }

        (localized, downloads)
    }
}

/// Drop root and prefix components so the path can be nested under another directory.
fn relative_to_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::RootDir | Component::Prefix(_)))
        .collect()
}
