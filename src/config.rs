//! Service configuration module.
//!
//! Handles loading, validating, and merging `facecrop.toml`. Stock defaults
//! are overridden by whatever the user file specifies; a missing file means
//! stock defaults throughout.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! bind = "127.0.0.1:3000"   # Listen address
//! workers = 4               # Request workers (omit for auto = CPU cores)
//!
//! [catalog]
//! path = "public/meta.json" # Image catalog (JSON array)
//! static_root = "public"    # Root that catalog `data` paths resolve against
//!
//! [response]
//! cache_control = "public, no-cache, must-revalidate"
//!
//! [embed]
//! memoize = true            # Keep encoded data URIs in memory
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `facecrop.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Where the image catalog and rasters live.
    pub catalog: CatalogConfig,
    /// Response header settings.
    pub response: ResponseConfig,
    /// Raster embedding settings.
    pub embed: EmbedConfig,
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind must be a socket address like 127.0.0.1:3000, got {:?}",
                self.server.bind
            )));
        }
        if self.server.workers == Some(0) {
            return Err(ConfigError::Validation(
                "server.workers must be at least 1".into(),
            ));
        }
        if self.catalog.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.path must not be empty".into(),
            ));
        }
        if self.response.cache_control.trim().is_empty() {
            return Err(ConfigError::Validation(
                "response.cache_control must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// Number of request workers. When absent, defaults to the number of
    /// CPU cores. Values larger than the core count are clamped down.
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            workers: None,
        }
    }
}

/// Resolve the effective worker count from config.
///
/// This sizes the rayon pool that answers HTTP requests (see
/// [`crate::server::worker_pool`]); the accept loop runs separately.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ServerConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.workers.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Catalog location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Path to the `meta.json` catalog.
    pub path: String,
    /// Directory that catalog `data` references resolve against.
    pub static_root: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "public/meta.json".to_string(),
            static_root: "public".to_string(),
        }
    }
}

/// Response header settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponseConfig {
    /// `Cache-Control` header for SVG responses.
    pub cache_control: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            cache_control: "public, no-cache, must-revalidate".to_string(),
        }
    }
}

/// Raster embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbedConfig {
    /// Keep encoded `data:` URIs in memory for the process lifetime.
    pub memoize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self { memoize: true }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ServiceConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// Layers a sparse `facecrop.toml` over [`stock_defaults_value`], so a file
/// with only `[server] workers = 2` keeps the stock bind address and the
/// `[catalog]`, `[response]` and `[embed]` defaults.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ServiceConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        log::debug!("No config at {}, using stock defaults", path.display());
    }
    resolve_config(overlay)
}

/// Returns a fully-commented stock `facecrop.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# facecrop Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
# Socket address to listen on.
bind = "127.0.0.1:3000"

# Request worker threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# workers = 4

# ---------------------------------------------------------------------------
# Image catalog
# ---------------------------------------------------------------------------
[catalog]
# JSON array of {data, source, width, height, face?} entries.
path = "public/meta.json"

# Directory that each entry's `data` path is resolved against.
static_root = "public"

# ---------------------------------------------------------------------------
# Responses
# ---------------------------------------------------------------------------
[response]
# Output is random per request: let caches store it, but always revalidate.
cache_control = "public, no-cache, must-revalidate"

# ---------------------------------------------------------------------------
# Raster embedding
# ---------------------------------------------------------------------------
[embed]
# Keep base64-encoded images in memory after first use.
memoize = true
"##
}
