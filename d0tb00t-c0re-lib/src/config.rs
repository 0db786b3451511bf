//! Operator settings
//!
//! Loaded from `<config_dir>/d0tb00t/config.toml` when present, or from an
//! explicit path. Loading never writes anything: a missing default file just
//! yields the defaults.

use crate::bootstrap::context::is_search_path_entry;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which system package manager `system` targets go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemManagerPreference {
    /// Pick the first manager found on the search path at dispatch time.
    #[default]
    Auto,
    Brew,
    Apt,
    Dnf,
    Pacman,
}

impl fmt::Display for SystemManagerPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Brew => "brew",
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Alternative catalog file; the embedded catalog is used otherwise.
    pub catalog: Option<PathBuf>,
    /// Where fonts are extracted; overrides the catalog's default.
    pub fonts_dir: Option<String>,
    pub system_manager: SystemManagerPreference,
    /// Directories prepended to the search path before the first probe.
    pub extra_paths: Vec<String>,
    /// Variables set for every install command (proxies, mirrors).
    pub env: BTreeMap<String, String>,
}

impl Settings {
    /// Load settings from `explicit`, or from the default location when it
    /// exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let Some(dir) = settings.extra_paths.iter().find(|d| !is_search_path_entry(d)) {
            anyhow::bail!(
                "{}: extra_paths entry `{dir}` must be a single directory",
                path.display()
            );
        }
        Ok(settings)
    }
}

/// `<config_dir>/d0tb00t/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("d0tb00t").join("config.toml"))
}
