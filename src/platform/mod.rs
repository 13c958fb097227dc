//! Platform policy for system-service installation
//!
//! Where init scripts and their configuration files land depends on the host
//! distribution. The manifest builder asks an injected [`ServicePlatform`] for
//! these locations instead of hardcoding them.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const REDHAT_RELEASE_FILE: &str = "/etc/redhat-release";
const DEBIAN_VERSION_FILE: &str = "/etc/debian_version";

/// Directories used when installing a SysV-style service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDirs {
    pub init_dir: PathBuf,
    pub config_dir: PathBuf,
}

pub trait ServicePlatform: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// `None` when the platform cannot host a system service.
    fn service_dirs(&self) -> Option<ServiceDirs>;
}

#[derive(Debug, Clone, Default)]
pub struct RedHatPlatform;

impl ServicePlatform for RedHatPlatform {
    fn name(&self) -> &str {
        "redhat"
    }

    fn service_dirs(&self) -> Option<ServiceDirs> {
        Some(ServiceDirs {
            init_dir: PathBuf::from("/etc/init.d"),
            config_dir: PathBuf::from("/etc/sysconfig"),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebianPlatform;

impl ServicePlatform for DebianPlatform {
    fn name(&self) -> &str {
        "debian"
    }

    fn service_dirs(&self) -> Option<ServiceDirs> {
        Some(ServiceDirs {
            init_dir: PathBuf::from("/etc/init.d"),
            config_dir: PathBuf::from("/etc/default"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UnsupportedPlatform {
    name: String,
}

impl UnsupportedPlatform {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ServicePlatform for UnsupportedPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn service_dirs(&self) -> Option<ServiceDirs> {
        None
    }
}

/// Pick the policy for the running host.
pub fn detect_platform() -> Arc<dyn ServicePlatform> {
    detect_platform_at(std::env::consts::OS, Path::new("/"))
}

/// Detection against an arbitrary filesystem root, used for chroots and tests.
pub fn detect_platform_at(os: &str, root: &Path) -> Arc<dyn ServicePlatform> {
    let platform: Arc<dyn ServicePlatform> = if os != "linux" {
        Arc::new(UnsupportedPlatform::new(os))
    } else if root.join(REDHAT_RELEASE_FILE.trim_start_matches('/')).exists() {
        Arc::new(RedHatPlatform)
    } else if root.join(DEBIAN_VERSION_FILE.trim_start_matches('/')).exists() {
        Arc::new(DebianPlatform)
    } else {
        Arc::new(UnsupportedPlatform::new("linux"))
    };

    debug!(platform = platform.name(), "Detected service platform");
    platform
}

/// Resolve a platform by name (`redhat`, `debian`, `none`), as used on the command line.
pub fn platform_by_name(name: &str) -> Option<Arc<dyn ServicePlatform>> {
    match name.to_lowercase().as_str() {
        "redhat" | "rhel" | "fedora" | "centos" => Some(Arc::new(RedHatPlatform)),
        "debian" | "ubuntu" => Some(Arc::new(DebianPlatform)),
        "none" => Some(Arc::new(UnsupportedPlatform::new("none"))),
        "auto" => Some(detect_platform()),
        _ => None,
    }
}
