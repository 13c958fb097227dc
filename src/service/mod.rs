//! Service manager implementations

pub mod init;

pub use init::InitServiceManager;

use crate::manifest::SystemServiceDeclaration;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceManagerError {
    #[error("Service {action} failed for {service}: {error}")]
    ActionFailed {
        service: String,
        action: &'static str,
        error: String,
    },

    #[error("Command execution failed: {error}")]
    CommandFailed { error: String },
}

impl From<std::io::Error> for ServiceManagerError {
    fn from(err: std::io::Error) -> Self {
        ServiceManagerError::CommandFailed {
            error: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ServiceResult {
    /// Turn an unsuccessful command into an error naming the service and action.
    pub fn into_result(
        self,
        service: &str,
        action: &'static str,
    ) -> Result<ServiceResult, ServiceManagerError> {
        if self.success {
            Ok(self)
        } else {
            Err(ServiceManagerError::ActionFailed {
                service: service.to_string(),
                action,
                error: format!("exit code {}: {}", self.exit_code, self.stderr.trim()),
            })
        }
    }
}

#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Register the service for its run levels.
    async fn enable_service(
        &self,
        service: &SystemServiceDeclaration,
    ) -> Result<ServiceResult, ServiceManagerError>;
    async fn disable_service(&self, name: &str) -> Result<ServiceResult, ServiceManagerError>;
    async fn start_service(&self, name: &str) -> Result<ServiceResult, ServiceManagerError>;
    async fn stop_service(&self, name: &str) -> Result<ServiceResult, ServiceManagerError>;
}
