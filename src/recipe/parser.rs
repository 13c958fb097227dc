use crate::recipe::{Recipe, RecipeError, Result};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecipeFormat {
    Json,
    Yaml,
    #[default]
    Auto,
}

impl std::str::FromStr for RecipeFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(RecipeFormat::Json),
            "yaml" | "yml" => Ok(RecipeFormat::Yaml),
            "auto" => Ok(RecipeFormat::Auto),
            _ => Err(format!("Unsupported recipe format: {s}")),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecipeParser;

impl RecipeParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str, format: RecipeFormat) -> Result<Recipe> {
        let detected_format = match format {
            RecipeFormat::Auto => Self::detect_format(content),
            format => format,
        };

        match detected_format {
            RecipeFormat::Json => {
                serde_json::from_str(content).map_err(|e| RecipeError::InvalidJson {
                    reason: e.to_string(),
                })
            }
            RecipeFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| RecipeError::InvalidYaml {
                    reason: e.to_string(),
                })
            }
            RecipeFormat::Auto => unreachable!("Auto format should be resolved by now"),
        }
    }

    pub async fn load(&self, path: &Path, format: RecipeFormat) -> Result<Recipe> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RecipeError::FileNotFound {
                    path: path.display().to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let format = match format {
            RecipeFormat::Auto => match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => RecipeFormat::Json,
                Some("yaml") | Some("yml") => RecipeFormat::Yaml,
                _ => RecipeFormat::Auto,
            },
            format => format,
        };

        debug!(path = %path.display(), ?format, "Loading recipe");
        self.parse(&content, format)
    }

    fn detect_format(content: &str) -> RecipeFormat {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') {
            RecipeFormat::Json
        } else {
            RecipeFormat::Yaml
        }
    }
}
