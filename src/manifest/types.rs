//! Declarations registered on a deployment unit

use super::{ManifestError, Result};
use crate::pattern::FileSetSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Where the content of a file or archive comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSource {
    Local(PathBuf),
    Url(Url),
}

impl FileSource {
    /// The file name the content carries when no explicit destination names it.
    pub fn base_name(&self) -> Option<String> {
        match self {
            FileSource::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            FileSource::Url(url) => Some(url_base_name(url)),
        }
    }
}

impl fmt::Display for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Local(path) => write!(f, "{}", path.display()),
            FileSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Last path segment of a URL, or its host when the path is empty.
pub fn url_base_name(url: &Url) -> String {
    let path = url.path().trim_end_matches('/');
    let last = path.rsplit('/').next().unwrap_or_default();

    if last.is_empty() {
        url.host_str().unwrap_or_default().to_string()
    } else {
        last.to_string()
    }
}

/// Instructions for passing content to a handover target instead of the deployer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Handover {
    pub action: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// A target reporting failure aborts the deployment
    #[serde(default = "default_fail_on_error")]
    pub fail_on_error: bool,
}

fn default_fail_on_error() -> bool {
    true
}

impl Handover {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: BTreeMap::new(),
            fail_on_error: true,
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }
}

impl fmt::Display for Handover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handover [action={}, failOnError={}", self.action, self.fail_on_error)?;
        for (name, value) in &self.params {
            write!(f, ", {name}={value}")?;
        }
        write!(f, "]")
    }
}

/// Whether handed-over content is a plain file or an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Archive,
}

/// A file or archive passed to the handover target after deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoverContent {
    pub source: FileSource,
    pub kind: ContentKind,
    pub handover: Handover,
}

/// A raw file laid down as-is (or with template tokens replaced)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDeclaration {
    pub source: FileSource,
    /// Path of the file inside the bundle distribution
    pub name: Option<String>,
    pub destination_file: Option<PathBuf>,
    pub destination_dir: Option<PathBuf>,
    pub replace: bool,
    /// Hand the file over instead of laying it down
    pub handover: Option<Handover>,
}

impl FileDeclaration {
    pub fn local(source: impl Into<PathBuf>) -> Self {
        Self::from_source(FileSource::Local(source.into()))
    }

    pub fn url(source: Url) -> Self {
        Self::from_source(FileSource::Url(source))
    }

    fn from_source(source: FileSource) -> Self {
        Self {
            source,
            name: None,
            destination_file: None,
            destination_dir: None,
            replace: false,
            handover: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn to_file(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination_file = Some(destination.into());
        self
    }

    pub fn into_dir(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination_dir = Some(destination.into());
        self
    }

    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn handover(mut self, handover: Handover) -> Self {
        self.handover = Some(handover);
        self
    }

    /// Effective destination: the explicit file, else `<dir>/<base name>`, else the base name.
    ///
    /// Relative results are relative to the deployment directory.
    pub fn destination(&self) -> Result<PathBuf> {
        match (&self.destination_file, &self.destination_dir) {
            (Some(_), Some(_)) => Err(ManifestError::ConflictingAttributes {
                element: self.element(),
                first: "destinationFile",
                second: "destinationDir",
            }),
            (Some(file), None) => Ok(file.clone()),
            (None, dir) => {
                let base_name =
                    self.source
                        .base_name()
                        .ok_or_else(|| ManifestError::UnnamedSource {
                            element: self.element(),
                            source_path: self.source.to_string(),
                        })?;
                Ok(match dir {
                    Some(dir) => dir.join(base_name),
                    None => PathBuf::from(base_name),
                })
            }
        }
    }

    pub(crate) fn element(&self) -> &'static str {
        match self.source {
            FileSource::Local(_) => "file",
            FileSource::Url(_) => "url-file",
        }
    }
}

/// An archive, deployed compressed or exploded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDeclaration {
    pub source: FileSource,
    pub name: Option<String>,
    /// `None` means the deployment directory itself
    pub destination_dir: Option<PathBuf>,
    pub exploded: bool,
    /// Archive entries whose template tokens are replaced
    pub replace: Vec<FileSetSpec>,
    pub handover: Option<Handover>,
}

impl ArchiveDeclaration {
    pub fn local(source: impl Into<PathBuf>) -> Self {
        Self::from_source(FileSource::Local(source.into()))
    }

    pub fn url(source: Url) -> Self {
        Self::from_source(FileSource::Url(source))
    }

    fn from_source(source: FileSource) -> Self {
        Self {
            source,
            name: None,
            destination_dir: None,
            exploded: false,
            replace: Vec::new(),
            handover: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn into_dir(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination_dir = Some(destination.into());
        self
    }

    pub fn exploded(mut self, exploded: bool) -> Self {
        self.exploded = exploded;
        self
    }

    pub fn replace(mut self, file_set: FileSetSpec) -> Self {
        self.replace.push(file_set);
        self
    }

    pub fn handover(mut self, handover: Handover) -> Self {
        self.handover = Some(handover);
        self
    }
}

pub const DEFAULT_START_LEVELS: &str = "3,4,5";
pub const DEFAULT_START_PRIORITY: u8 = 80;
pub const DEFAULT_STOP_PRIORITY: u8 = 20;

/// A SysV init script, with an optional configuration file, installed as a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemServiceDeclaration {
    pub name: String,
    pub script_file: PathBuf,
    pub config_file: Option<PathBuf>,
    pub start_levels: String,
    pub start_priority: u8,
    pub stop_priority: u8,
    /// Alternate filesystem root the service is installed under
    pub root: Option<PathBuf>,
}

impl SystemServiceDeclaration {
    pub fn new(name: impl Into<String>, script_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            script_file: script_file.into(),
            config_file: None,
            start_levels: DEFAULT_START_LEVELS.to_string(),
            start_priority: DEFAULT_START_PRIORITY,
            stop_priority: DEFAULT_STOP_PRIORITY,
            root: None,
        }
    }

    pub fn with_config_file(mut self, config_file: impl Into<PathBuf>) -> Self {
        self.config_file = Some(config_file.into());
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.name.contains(['/', '\\']) {
            return Err(self.invalid("name", &self.name, "must be a plain, non-empty service name"));
        }

        if self.script_file.file_name().is_none() {
            return Err(ManifestError::UnnamedSource {
                element: "system-service",
                source_path: self.script_file.display().to_string(),
            });
        }

        let levels_valid = !self.start_levels.is_empty()
            && self.start_levels.split(',').all(|level| {
                let level = level.trim();
                level.len() == 1 && matches!(level.as_bytes()[0], b'0'..=b'6')
            });
        if !levels_valid {
            return Err(self.invalid(
                "startLevels",
                &self.start_levels,
                "must be a comma-separated list of run levels 0-6",
            ));
        }

        for (attribute, priority) in [
            ("startPriority", self.start_priority),
            ("stopPriority", self.stop_priority),
        ] {
            if priority > 99 {
                return Err(self.invalid(attribute, &priority.to_string(), "must be between 0 and 99"));
            }
        }

        Ok(())
    }

    /// Destination of a file under `dir`, named after the service and moved under `root`.
    pub(crate) fn destination_in(&self, dir: &Path) -> PathBuf {
        let target = dir.join(&self.name);
        match &self.root {
            Some(root) => root.join(target.strip_prefix("/").unwrap_or(target.as_path())),
            None => target,
        }
    }

    fn invalid(&self, attribute: &'static str, value: &str, reason: &str) -> ManifestError {
        ManifestError::InvalidAttribute {
            element: "system-service",
            attribute,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
