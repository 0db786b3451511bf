//! Process-wide configuration context
//!
//! Holds the search path, home directory and extra environment that every
//! probe and install step sees. Steps that extend the search path do so
//! through `&mut ProcessContext`, so later steps in the same run resolve the
//! freshly installed binaries.

use crate::config::SystemManagerPreference;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProcessContext {
    home: PathBuf,
    search_path: Vec<PathBuf>,
    env: BTreeMap<String, String>,
    system_manager: SystemManagerPreference,
}

impl ProcessContext {
    /// Build a context from the current process environment.
    pub fn from_env(system_manager: SystemManagerPreference) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        let search_path = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();

        Self {
            home,
            search_path,
            env: BTreeMap::new(),
            system_manager,
        }
    }

    /// Build a context with an explicit home and search path.
    pub fn new(home: impl Into<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        Self {
            home: home.into(),
            search_path,
            env: BTreeMap::new(),
            system_manager: SystemManagerPreference::Auto,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn system_manager(&self) -> SystemManagerPreference {
        self.system_manager
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Joined `PATH` value for child processes and lookups. Entries are
    /// checked on the way in, so joining cannot fail.
    pub fn path_var(&self) -> OsString {
        std::env::join_paths(&self.search_path).unwrap_or_default()
    }

    /// Expand a leading `~` against this context's home directory.
    pub fn expand(&self, path: &str) -> PathBuf {
        let home = self.home.to_string_lossy().into_owned();
        let expanded = shellexpand::tilde_with_context(path, || Some(home.as_str()));
        PathBuf::from(expanded.as_ref())
    }

    /// Put `dir` at the front of the search path. Already present entries
    /// are moved rather than duplicated; entries holding the platform path
    /// separator are refused.
    pub fn prepend_path(&mut self, dir: &str) {
        if !is_search_path_entry(dir) {
            tracing::warn!(dir, "not a single search path entry, ignoring");
            return;
        }
        let dir = self.expand(dir);
        self.search_path.retain(|p| p != &dir);
        self.search_path.insert(0, dir);
    }

    /// Extra variable passed to every install command.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }
}

/// Whether `dir` can sit in `PATH` as one entry.
pub fn is_search_path_entry(dir: &str) -> bool {
    !dir.is_empty() && std::env::join_paths([dir]).is_ok()
}
