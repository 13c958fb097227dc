//! Init script service manager for SysV-style Linux systems

use crate::manifest::SystemServiceDeclaration;
use crate::service::{ServiceManager, ServiceManagerError, ServiceResult};
use async_trait::async_trait;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

pub struct InitServiceManager;

impl Default for InitServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InitServiceManager {
    pub fn new() -> Self {
        Self
    }

    async fn run(program: &str, args: &[&str]) -> Result<ServiceResult, ServiceManagerError> {
        debug!(program, ?args, "Running service command");
        let output = Command::new(program).args(args).output().await?;
        Ok(to_result(output))
    }
}

fn to_result(output: Output) -> ServiceResult {
    ServiceResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// `3,4,5` -> `345`, the form chkconfig expects
pub fn chkconfig_levels(start_levels: &str) -> String {
    start_levels
        .split(',')
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .collect()
}

#[async_trait]
impl ServiceManager for InitServiceManager {
    async fn enable_service(
        &self,
        service: &SystemServiceDeclaration,
    ) -> Result<ServiceResult, ServiceManagerError> {
        let levels = chkconfig_levels(&service.start_levels);

        // Try chkconfig first, then update-rc.d
        if let Ok(result) = Self::run("chkconfig", &["--add", &service.name]).await {
            if result.success {
                return Self::run("chkconfig", &["--level", &levels, &service.name, "on"]).await;
            }
        }

        let start = service.start_priority.to_string();
        let stop = service.stop_priority.to_string();
        Self::run("update-rc.d", &[&service.name, "defaults", &start, &stop]).await
    }

    async fn disable_service(&self, name: &str) -> Result<ServiceResult, ServiceManagerError> {
        if let Ok(result) = Self::run("chkconfig", &["--del", name]).await {
            if result.success {
                return Ok(result);
            }
        }

        Self::run("update-rc.d", &["-f", name, "remove"]).await
    }

    async fn start_service(&self, name: &str) -> Result<ServiceResult, ServiceManagerError> {
        Self::run("service", &[name, "start"]).await
    }

    async fn stop_service(&self, name: &str) -> Result<ServiceResult, ServiceManagerError> {
        Self::run("service", &[name, "stop"]).await
    }
}
