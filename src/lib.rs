//! Bundle Deploy - deployment-unit manifests for bundle recipes
//!
//! This crate compiles include/exclude file-set globs into matchers, assembles
//! the file and archive manifest of a deployment unit, and hands the result to
//! a pluggable deployer.

pub mod deploy;
pub mod manifest;
pub mod pattern;
pub mod platform;
pub mod recipe;
pub mod service;

pub use deploy::{DeploymentManager, DeploymentUnit};
pub use manifest::{DeploymentManifest, DeploymentManifestBuilder, ManifestError};
pub use pattern::{compile_file_sets, CompiledPattern, FileSetSpec, PatternCompiler, PatternSyntax};
