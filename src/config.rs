//! Project configuration.
//!
//! Handles loading, validating, and merging `catalog.toml`. Stock defaults
//! are overridden by an optional `catalog.toml` in the project directory
//! (the directory that contains `assets/` and the index scripts).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! assets_dir = "assets"     # Holds logos/ and productos/
//! size_options = ["XXS", "XS", "S", "M", "L", "XL", "XXL"]
//!
//! [index]
//! enabled = true            # Regenerate indexes after every change
//!
//! [[index.steps]]
//! name = "generateAssetsIndex.js"
//! program = "node"
//! args = ["scripts/generateAssetsIndex.js"]
//!
//! [[index.steps]]
//! name = "generateProductsIndex.js"
//! program = "node"
//! args = ["scripts/generateProductsIndex.js"]
//! ```
//!
//! Config files are sparse: override just the values you want. Arrays
//! (`size_options`, `index.steps`) replace the default list as a whole.
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file inside the project directory.
pub const CONFIG_FILENAME: &str = "catalog.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `catalog.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Directory (relative to the project) holding `logos/` and `productos/`.
    pub assets_dir: String,
    /// Known product sizes. Others are accepted with a warning.
    pub size_options: Vec<String>,
    /// Index regeneration after catalog changes.
    pub index: IndexConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
            size_options: ["XXS", "XS", "S", "M", "L", "XL", "XXL"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            index: IndexConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "assets_dir must not be empty".into(),
            ));
        }
        for (i, step) in self.index.steps.iter().enumerate() {
            if step.name.trim().is_empty() || step.program.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "index.steps[{i}] needs a name and a program"
                )));
            }
        }
        Ok(())
    }

    /// Sizes not present in `size_options`.
    pub fn unknown_sizes<'a>(&self, sizes: &'a [String]) -> Vec<&'a str> {
        sizes
            .iter()
            .map(String::as_str)
            .filter(|s| !self.size_options.iter().any(|o| o == s))
            .collect()
    }
}

/// Index regeneration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    pub enabled: bool,
    /// Commands run in order, from the project directory.
    pub steps: Vec<IndexStep>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            steps: vec![
                IndexStep::node_script("generateAssetsIndex.js"),
                IndexStep::node_script("generateProductsIndex.js"),
            ],
        }
    }
}

/// One external command of the regeneration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexStep {
    /// Label used as the section header in captured output.
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl IndexStep {
    fn node_script(script: &str) -> Self {
        Self {
            name: script.to_string(),
            program: "node".to_string(),
            args: vec![format!("scripts/{script}")],
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// The built-in catalog settings as a TOML table, the base every
/// `catalog.toml` is merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CatalogConfig::default()).expect("default config must serialize")
}

/// Lay a sparse `catalog.toml` over the defaults.
///
/// Tables such as `[index]` merge key by key, so `enabled = false` alone
/// keeps the default steps. Any other value, arrays included, replaces the
/// default outright: a `[[index.steps]]` list or `size_options` is taken as
/// the complete list.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `catalog.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(project_dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config for a project directory: user values over stock defaults,
/// unknown keys rejected, result validated.
pub fn load_config(project_dir: &Path) -> Result<CatalogConfig, ConfigError> {
    let merged = match load_raw_config(project_dir)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: CatalogConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `catalog.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Catalog Admin Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Directory holding logos/ and productos/, relative to the project directory.
assets_dir = "assets"

# Known product sizes. Sizes outside this list are stored but reported.
size_options = ["XXS", "XS", "S", "M", "L", "XL", "XXL"]

# ---------------------------------------------------------------------------
# Index regeneration
# ---------------------------------------------------------------------------
[index]
# Run the steps below after every change to the catalog.
# Failures are reported as warnings and never undo the change.
enabled = true

# Steps run in order from the project directory. Listing steps here
# replaces the whole default list.
[[index.steps]]
name = "generateAssetsIndex.js"
program = "node"
args = ["scripts/generateAssetsIndex.js"]

[[index.steps]]
name = "generateProductsIndex.js"
program = "node"
args = ["scripts/generateProductsIndex.js"]
"##
}
