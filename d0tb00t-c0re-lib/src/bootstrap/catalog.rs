//! Installation catalog
//!
//! Typed table of everything the bootstrapper knows how to install. Parsed
//! once at startup from TOML (the embedded default or an operator supplied
//! file) and validated before any prompt is shown. Both the dispatcher and
//! the `--list` output read from here, so adding a tool is a single edit.

use crate::bootstrap::context::is_search_path_entry;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

const DEFAULT_CATALOG: &str = include_str!("../../catalog/default.toml");

/// How a target is acquired. Matched exhaustively by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Download an installer script and run it with a shell.
    Script,
    /// Download a zip archive and extract it into `dest`.
    Archive,
    /// Shallow clone of a git repository into `dest`.
    Git,
    /// Host package manager (brew, apt-get, dnf, pacman).
    System,
    Pipx,
    Cargo,
    RustupComponent,
    Npm,
    Go,
}

impl Method {
    /// Package manager that must be present before an ecosystem target is
    /// attempted. Other methods assume their installer is there.
    pub fn ecosystem_manager(self) -> Option<&'static str> {
        match self {
            Self::Npm => Some("npm"),
            Self::Go => Some("go"),
            _ => None,
        }
    }

    /// Targets that live in a directory rather than on the search path.
    pub fn needs_dest(self) -> bool {
        matches!(self, Self::Archive | Self::Git)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Script => "script",
            Self::Archive => "archive",
            Self::Git => "git",
            Self::System => "system",
            Self::Pipx => "pipx",
            Self::Cargo => "cargo",
            Self::RustupComponent => "rustup-component",
            Self::Npm => "npm",
            Self::Go => "go",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallTarget {
    pub id: String,
    pub method: Method,
    pub reference: String,
    #[serde(default)]
    pub description: String,
    /// Name resolved on the search path when it differs from `id`.
    #[serde(default)]
    pub verify: Option<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub updatable: bool,
    #[serde(default)]
    pub companions: Vec<String>,
}

impl InstallTarget {
    pub fn new(id: impl Into<String>, method: Method, reference: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method,
            reference: reference.into(),
            description: String::new(),
            verify: None,
            extra_args: Vec::new(),
            dest: None,
            paths: Vec::new(),
            env: BTreeMap::new(),
            updatable: false,
            companions: Vec::new(),
        }
    }

    /// Name used for both the pre-check and the post-install check.
    pub fn verify_name(&self) -> &str {
        self.verify.as_deref().unwrap_or(&self.id)
    }

    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.id
        } else {
            &self.description
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallPhase {
    pub name: String,
    /// Binaries the whole phase depends on.
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub targets: Vec<InstallTarget>,
}

/// Which entry point a hard prerequisite belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Env,
    Fonts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrerequisiteSpec {
    pub name: String,
    pub scope: Scope,
    /// Semver requirement, e.g. ">=2.0.0".
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub install_hint: Option<String>,
    /// Restrict to one `std::env::consts::OS` value.
    #[serde(default)]
    pub os: Option<String>,
}

impl PrerequisiteSpec {
    pub fn applies_here(&self) -> bool {
        self.os
            .as_deref()
            .is_none_or(|os| os == std::env::consts::OS)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontEntry {
    /// Archive file name without `.zip`; also the install directory name.
    pub stem: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontCatalog {
    pub release: String,
    pub base_url: String,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default)]
    pub entries: Vec<FontEntry>,
}

impl FontCatalog {
    pub fn archive_url(&self, entry: &FontEntry) -> String {
        format!(
            "{}/{}/{}.zip",
            self.base_url.trim_end_matches('/'),
            self.release,
            entry.stem
        )
    }

    /// Destination root, falling back to the platform's per-user font dir.
    pub fn default_dest(&self) -> &str {
        self.dest.as_deref().unwrap_or(if cfg!(target_os = "macos") {
            "~/Library/Fonts"
        } else {
            "~/.local/share/fonts"
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub prerequisites: Vec<PrerequisiteSpec>,
    #[serde(default)]
    pub phases: Vec<InstallPhase>,
    pub fonts: FontCatalog,
}

impl Catalog {
    /// Load the catalog from `path`, or the embedded default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read catalog {}", path.display()))?;
                Self::parse(&content)
                    .with_context(|| format!("Invalid catalog {}", path.display()))
            }
            None => Self::parse(DEFAULT_CATALOG).context("Invalid embedded catalog"),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(content).context("Failed to parse catalog TOML")?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for target in self.phases.iter().flat_map(|p| &p.targets) {
            if !ids.insert(target.id.as_str()) {
                anyhow::bail!("duplicate target id `{}`", target.id);
            }
            if target.reference.trim().is_empty() {
                anyhow::bail!("target `{}` has an empty reference", target.id);
            }
            if target.method.needs_dest() && target.dest.is_none() {
                anyhow::bail!(
                    "target `{}` uses the {} method and needs a `dest`",
                    target.id,
                    target.method
                );
            }
            if let Some(dir) = target.paths.iter().find(|d| !is_search_path_entry(d)) {
                anyhow::bail!(
                    "target `{}`: `{dir}` cannot be a search path entry",
                    target.id
                );
            }
            if !target.companions.is_empty() && target.method != Method::Npm {
                anyhow::bail!(
                    "target `{}`: companions are only supported for npm targets",
                    target.id
                );
            }
        }

        let mut stems = HashSet::new();
        for entry in &self.fonts.entries {
            if !stems.insert(entry.stem.as_str()) {
                anyhow::bail!("duplicate font stem `{}`", entry.stem);
            }
        }

        Ok(())
    }

    pub fn prerequisites_for(&self, scope: Scope) -> Vec<&PrerequisiteSpec> {
        self.prerequisites
            .iter()
            .filter(|p| p.scope == scope && p.applies_here())
            .collect()
    }
}
