use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{GalleryError, Result};
use crate::session::DEFAULT_IMAGE_LIMIT;

/// Name of the project-local config file
pub const LOCAL_CONFIG_FILE: &str = "treegen.toml";

/// Layered TOML configuration for the viewer and the relay server
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GalleryConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub server: ServerSettings,
}

/// Where the viewer connects and how many images it collects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    #[serde(default = "default_output_path")]
    pub output_path: String,

    #[serde(default = "default_image_limit")]
    pub image_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_path: default_stream_path(),
            output_path: default_output_path(),
            image_limit: default_image_limit(),
        }
    }
}

impl ClientConfig {
    /// Full URL of the event stream endpoint
    pub fn stream_url(&self) -> String {
        join_url(&self.base_url, &self.stream_path)
    }

    /// Prefix that received filenames are appended to
    pub fn output_base(&self) -> String {
        join_url(&self.base_url, &self.output_path)
    }
}

/// Relay server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Generator program and its arguments
    #[serde(default = "default_generator")]
    pub generator: Vec<String>,

    /// Working directory for the generator (defaults to the current directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,

    /// Directory the rendered images are served from
    #[serde(default = "default_pics_dir")]
    pub pics_dir: PathBuf,

    /// Text that marks a generator output line as "image rendered"
    #[serde(default = "default_marker")]
    pub marker: String,

    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            generator: default_generator(),
            workdir: None,
            pics_dir: default_pics_dir(),
            marker: default_marker(),
            cors_permissive: default_cors_permissive(),
        }
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_stream_path() -> String {
    "/run-main".to_string()
}

fn default_output_path() -> String {
    "/output".to_string()
}

fn default_image_limit() -> usize {
    DEFAULT_IMAGE_LIMIT
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_generator() -> Vec<String> {
    vec!["python".to_string(), "main.py".to_string()]
}

fn default_pics_dir() -> PathBuf {
    PathBuf::from("pics")
}

fn default_marker() -> String {
    "Tree rendered to pics/".to_string()
}

fn default_cors_permissive() -> bool {
    true
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Get the treegen config directory path (~/.treegen)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".treegen"))
}

impl GalleryConfig {
    /// Load config from TOML files
    ///
    /// Priority order (highest to lowest):
    /// 1. ./treegen.toml (project-specific)
    /// 2. ~/.treegen/config.toml (user defaults)
    /// 3. Built-in defaults
    ///
    /// Unreadable or invalid files are logged and skipped.
    pub fn load() -> Self {
        let mut layers = Vec::new();
        if let Some(global_path) = Self::global_path() {
            layers.push(global_path);
        }
        layers.push(PathBuf::from(LOCAL_CONFIG_FILE));

        Self::from_layers(&layers)
    }

    /// Merge config files in order. A later file overrides only the keys it
    /// sets; everything else comes from earlier files or the defaults.
    ///
    /// Missing files are skipped silently, invalid ones with a warning.
    pub fn from_layers<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut config = GalleryConfig::default();
        let mut merged = toml::Table::new();

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }

            let layer = match read_table(path) {
                Ok(layer) => layer,
                Err(e) => {
                    warn!("Ignoring {}: {}", path.display(), e);
                    continue;
                }
            };

            let mut candidate = merged.clone();
            merge_tables(&mut candidate, layer);

            match Self::from_table(candidate.clone(), path) {
                Ok(parsed) => {
                    debug!("Loaded config from {}", path.display());
                    merged = candidate;
                    config = parsed;
                }
                Err(e) => warn!("Ignoring {}: {}", path.display(), e),
            }
        }

        config
    }

    /// Load a single explicit config file; errors are returned, not skipped.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_table(read_table(path)?, path)
    }

    fn from_table(table: toml::Table, path: &Path) -> Result<Self> {
        let config: Self = toml::Value::Table(table)
            .try_into()
            .map_err(|e| GalleryError::toml(path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Global config file path: ~/.treegen/config.toml
    pub fn global_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Reject settings the viewer or relay cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.client.image_limit == 0 {
            return Err(GalleryError::config("client.image_limit must be at least 1"));
        }
        if self.server.generator.is_empty() {
            return Err(GalleryError::config("server.generator must name a program"));
        }
        if self.server.marker.is_empty() {
            return Err(GalleryError::config("server.marker must not be empty"));
        }
        Ok(())
    }

    /// Serialize for `treegen config show` / `init`
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GalleryError::config(e.to_string()))
    }
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| GalleryError::toml(path, e))
}

/// Overlay `overlay` onto `base`, recursing into nested tables
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
