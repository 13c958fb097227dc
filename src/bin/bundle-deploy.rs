use anyhow::{anyhow, Context, Result};
use bundle_deploy::pattern::PatternSyntax;
use bundle_deploy::platform::platform_by_name;
use bundle_deploy::recipe::{RecipeFormat, RecipeParser};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "bundle-deploy")]
#[command(about = "Build and inspect the deployment manifest of a bundle recipe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct BundleDeployCli {
    /// Recipe file describing the deployment unit (YAML or JSON)
    recipe: PathBuf,

    /// Bundle distribution directory (defaults to the recipe's directory)
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Recipe format: auto, json or yaml
    #[arg(long, default_value = "auto")]
    format: String,

    /// Relative path to test against the unit's ignore pattern (repeatable)
    #[arg(long = "check", value_name = "PATH")]
    checks: Vec<String>,

    /// Keep regex metacharacters in globs unescaped, as older recipes expect
    /// (a recipe's own patternSyntax takes precedence)
    #[arg(long)]
    legacy_globs: bool,

    /// Service platform: auto, redhat, debian or none
    #[arg(long, default_value = "auto")]
    platform: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = BundleDeployCli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting bundle-deploy v{}", env!("CARGO_PKG_VERSION"));

    let format: RecipeFormat = cli.format.parse().map_err(|e: String| anyhow!(e))?;
    let platform = platform_by_name(&cli.platform)
        .ok_or_else(|| anyhow!("Unknown platform: {}", cli.platform))?;
    let syntax = if cli.legacy_globs {
        PatternSyntax::Legacy
    } else {
        PatternSyntax::Escaped
    };
    let base_dir = match &cli.base_dir {
        Some(dir) => dir.clone(),
        None => cli
            .recipe
            .parent()
            .map(|parent| parent.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let recipe = RecipeParser::new()
        .load(&cli.recipe, format)
        .await
        .with_context(|| format!("Failed to load recipe {}", cli.recipe.display()))?;
    debug!(unit = %recipe.name, base_dir = %base_dir.display(), "Building manifest");

    let manifest = recipe
        .build_manifest(&base_dir, platform, syntax)
        .with_context(|| format!("Invalid deployment unit '{}'", recipe.name))?;

    println!("{}", serde_json::to_string_pretty(&manifest)?);

    for path in &cli.checks {
        let verdict = if manifest.is_ignored(path) {
            "ignored"
        } else {
            "managed"
        };
        println!("{path}: {verdict}");
    }

    info!(
        unit = manifest.unit_name(),
        files = manifest.files().len(),
        archives = manifest.archives().len(),
        "Manifest built"
    );
    Ok(())
}
