//! Nerd Fonts selection and cache refresh
//!
//! Fonts are ordinary `archive` targets built from the catalog's font
//! descriptors, so they go through the same step runner as everything else.

use crate::bootstrap::catalog::{FontCatalog, InstallPhase, InstallTarget, Method};
use crate::bootstrap::context::ProcessContext;
use crate::bootstrap::installer::{CommandLine, CommandRunner};
use crate::bootstrap::probe::Probe;
use crate::bootstrap::report::Reporter;

/// What the operator picked at the selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Quit,
    /// Zero-based catalog indices, ascending, without duplicates.
    Indices(Vec<usize>),
}

/// Parse `a`/`all`, `q`/`quit`, or space separated 1-based indices.
/// Tokens that are not a valid index for `count` entries are dropped.
pub fn parse_selection(input: &str, count: usize) -> Selection {
    let input = input.trim().to_ascii_lowercase();
    match input.as_str() {
        "a" | "all" => return Selection::All,
        "q" | "quit" => return Selection::Quit,
        _ => {}
    }

    let mut indices: Vec<usize> = input
        .split_whitespace()
        .filter_map(|token| match token.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => Some(n - 1),
            _ => {
                tracing::debug!(token, "ignoring font selection token");
                None
            }
        })
        .collect();
    indices.sort_unstable();
    indices.dedup();
    Selection::Indices(indices)
}

/// One `archive` target per selected font, extracted under `dest_root`.
pub fn font_phase(fonts: &FontCatalog, dest_root: &str, selected: &[usize]) -> InstallPhase {
    let root = dest_root.trim_end_matches('/');
    let targets = selected
        .iter()
        .filter_map(|&i| fonts.entries.get(i))
        .map(|entry| {
            let mut target =
                InstallTarget::new(entry.stem.clone(), Method::Archive, fonts.archive_url(entry));
            target.description.clone_from(&entry.name);
            target.dest = Some(format!("{root}/{}", entry.stem));
            target
        })
        .collect();

    InstallPhase {
        name: "Fonts".to_string(),
        requires: Vec::new(),
        targets,
    }
}

/// Rebuild the font cache so new fonts show up without a re-login.
pub fn refresh_font_cache(
    runner: &dyn CommandRunner,
    probe: &dyn Probe,
    reporter: &dyn Reporter,
    ctx: &ProcessContext,
    dest_root: &str,
) {
    if cfg!(target_os = "macos") {
        return;
    }
    if !probe.has_command("fc-cache", ctx) {
        reporter.warning("fc-cache not found; log out and back in for the new fonts to appear");
        return;
    }

    let dir = ctx.expand(dest_root).to_string_lossy().into_owned();
    reporter.info("Refreshing font cache...");
    match runner.run(&CommandLine::new("fc-cache", ["-f".to_string(), dir]), ctx) {
        Ok(()) => reporter.success("Font cache refreshed"),
        Err(e) => reporter.warning(&format!("Font cache refresh failed: {e}")),
    }
}
