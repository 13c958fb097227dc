//! Destination directory compliance

use super::{ManifestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// How much of the destination directory the deployment takes ownership of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DestinationComplianceMode {
    /// Everything in the destination directory is managed; unknown files are backed up and removed
    Full,
    /// Unknown files and directories in the destination are left intact
    #[default]
    FilesAndDirectories,
}

impl DestinationComplianceMode {
    /// Map the deprecated boolean `manageRootDir` attribute onto a compliance mode.
    pub fn from_manage_root_dir(value: &str) -> Result<Self> {
        let mode = match value.to_lowercase().as_str() {
            "true" => DestinationComplianceMode::Full,
            "false" => DestinationComplianceMode::FilesAndDirectories,
            _ => {
                return Err(ManifestError::InvalidAttribute {
                    element: "deployment-unit",
                    attribute: "manageRootDir",
                    value: value.to_string(),
                    reason: "must be 'true' or 'false'".to_string(),
                })
            }
        };

        warn!(
            "The deprecated 'manageRootDir' attribute was detected. Please consider replacing it with the 'compliance' attribute."
        );
        Ok(mode)
    }
}

impl fmt::Display for DestinationComplianceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationComplianceMode::Full => write!(f, "full"),
            DestinationComplianceMode::FilesAndDirectories => write!(f, "filesAndDirectories"),
        }
    }
}

impl FromStr for DestinationComplianceMode {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(DestinationComplianceMode::Full),
            "filesAndDirectories" => Ok(DestinationComplianceMode::FilesAndDirectories),
            _ => Err(ManifestError::InvalidAttribute {
                element: "deployment-unit",
                attribute: "compliance",
                value: s.to_string(),
                reason: "expected 'full' or 'filesAndDirectories'".to_string(),
            }),
        }
    }
}
