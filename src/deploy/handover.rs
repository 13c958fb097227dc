//! The handover seam: content passed on to another system after deployment

use crate::deploy::Result;
use crate::manifest::ContentKind;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One file or archive offered to a [`HandoverTarget`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverInfo {
    /// Local copy of the content
    pub content: PathBuf,
    pub filename: String,
    pub kind: ContentKind,
    pub action: String,
    pub params: BTreeMap<String, String>,
    /// Set when the previous deployment is being reverted
    pub revert: bool,
}

#[async_trait]
pub trait HandoverTarget: Send + Sync {
    /// Returns `Ok(false)` when the target declined or failed to take the content.
    async fn handover_content(&self, info: &HandoverInfo) -> Result<bool>;
}
