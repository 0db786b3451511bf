//! Existence probe
//!
//! Pure queries against the process context. Absence is a normal `false`,
//! never an error.

use crate::bootstrap::catalog::InstallTarget;
use crate::bootstrap::context::ProcessContext;
use std::path::{Path, PathBuf};

pub trait Probe: Send + Sync {
    /// Whether `target` is already satisfied.
    fn is_satisfied(&self, target: &InstallTarget, ctx: &ProcessContext) -> bool;

    /// Whether `command` resolves on the context's search path.
    fn has_command(&self, command: &str, ctx: &ProcessContext) -> bool;
}

/// Probe backed by the real filesystem and search path.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathProbe;

impl Probe for PathProbe {
    fn is_satisfied(&self, target: &InstallTarget, ctx: &ProcessContext) -> bool {
        if target.method.needs_dest() {
            return target
                .dest
                .as_deref()
                .is_some_and(|dest| is_populated_dir(&ctx.expand(dest)));
        }
        self.has_command(target.verify_name(), ctx)
    }

    fn has_command(&self, command: &str, ctx: &ProcessContext) -> bool {
        find_command(command, ctx).is_some()
    }
}

/// Resolve `command` on the context's search path.
pub fn find_command(command: &str, ctx: &ProcessContext) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| ctx.home().to_path_buf());
    which::which_in(command, Some(ctx.path_var()), cwd).ok()
}

/// A directory with at least one entry in it.
pub fn is_populated_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
