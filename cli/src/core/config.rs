//! # pubstream Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module loads the defaults that `pubstream apply` and `pubstream pack`
//! fall back on when a flag is not given: the destination root, the line-ending
//! mode, the output encoding, whether backups are on, and the top-level folder
//! name used inside archives.
//!
//! The platform-specific default root lives here too, so the materializer never
//! branches on the host OS itself.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. An explicit file passed with `--config` (or `PUBSTREAM_CONFIG`). When
//!    given, no other file is consulted.
//! 2. Project-specific `.pubstream.toml` in the current directory or ancestors
//!    (the search stops at a directory containing `.git`).
//! 3. User-specific `<config dir>/pubstream/config.toml`.
//! 4. Default values defined in the code.
//!
//! Every field in the file is optional, so merging is a field-by-field `or`.
//!
//! ## Examples
//!
//! ```toml
//! [apply]
//! root = "~/sites/hydrometeo"
//! eol = "lf"
//! encoding = "utf-8"
//! backup = true
//!
//! [archive]
//! topname = "GidroMeteo"
//! ```
//!
//! ```rust
//! let cfg = config::load_config(None)?;
//! let root = cfg.root();
//! let eol = cfg.apply.eol.unwrap_or_default();
//! ```
//!
use crate::core::error::{Result, StreamError};
use crate::materialize::{Encoding, LineEnding};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub apply: ApplyConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Defaults for `pubstream apply`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApplyConfig {
    /// Destination root (can use ~). Will be expanded.
    pub root: Option<String>,
    /// Line-ending mode for written files.
    pub eol: Option<LineEnding>,
    /// Output text encoding.
    pub encoding: Option<Encoding>,
    /// Back up existing files before overwriting them.
    pub backup: Option<bool>,
}

/// Defaults for archive packaging (`--zip-out`, `pubstream pack`).
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Folder name prefixed to every path stored in the archive.
    pub topname: Option<String>,
}

const PROJECT_CONFIG_FILENAME: &str = ".pubstream.toml";
const DEFAULT_TOPNAME: &str = "GidroMeteo";

/// Root used when neither the command line nor any config file names one.
pub fn default_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Projects\GidroMeteo")
    } else {
        PathBuf::from("/opt/hydrometeo")
    }
}

impl Config {
    /// The configured root, or the platform default.
    pub fn root(&self) -> PathBuf {
        self.apply
            .root
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_root)
    }

    /// The configured archive folder name, or `GidroMeteo`.
    pub fn topname(&self) -> String {
        self.archive
            .topname
            .clone()
            .unwrap_or_else(|| DEFAULT_TOPNAME.to_string())
    }
}

/// Loads, merges, expands and validates the configuration.
///
/// # Arguments
///
/// * `explicit` - A config file named on the command line. When present it is
///   the only source consulted and it must exist.
///
/// # Errors
///
/// Returns an `Err` if a config file cannot be read or parsed, or if the merged
/// configuration fails validation.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut merged = match explicit {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            load_config_from_path(path)?
        }
        None => {
            let user_config = load_user_config()?;
            let project_config = load_project_config()?;
            merge_configs(user_config.unwrap_or_default(), project_config)
        }
    };
    expand_config_paths(&mut merged);
    validate_config(&merged).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged);
    Ok(merged)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "Pubstream", "pubstream") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.is_file() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    match find_project_config_path(&current_dir) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            load_config_from_path(&path).map(Some)
        }
        None => {
            debug!("No project configuration file ({PROJECT_CONFIG_FILENAME}) found.");
            Ok(None)
        }
    }
}

fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win; anything the project file leaves out falls back to the user file.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let Some(project) = project else {
        return user;
    };
    Config {
        apply: ApplyConfig {
            root: project.apply.root.or(user.apply.root),
            eol: project.apply.eol.or(user.apply.eol),
            encoding: project.apply.encoding.or(user.apply.encoding),
            backup: project.apply.backup.or(user.apply.backup),
        },
        archive: ArchiveConfig {
            topname: project.archive.topname.or(user.archive.topname),
        },
    }
}

fn expand_config_paths(config: &mut Config) {
    if let Some(root) = config.apply.root.as_mut() {
        *root = shellexpand::tilde(root).into_owned();
        debug!("Expanded root directory: {}", root);
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if let Some(topname) = &config.archive.topname {
        if topname.trim().is_empty() || topname.contains(['/', '\\']) {
            return Err(anyhow!(StreamError::Config(format!(
                "Invalid archive topname '{}'. Expected a single non-empty folder name.",
                topname
            ))));
        }
    }
    if let Some(root) = &config.apply.root {
        let root = Path::new(root);
        if root.exists() && !root.is_dir() {
            return Err(anyhow!(StreamError::Config(format!(
                "Configured root '{}' exists but is not a directory.",
                root.display()
            ))));
        }
    }
    Ok(())
}
