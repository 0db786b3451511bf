//! Entry point commands
//!
//! Both binaries share the same loading sequence: settings, then catalog,
//! then the process context. Nothing is written to disk before the operator
//! confirms.

pub mod env;
pub mod fonts;

use anyhow::{Context, Result};
use clap::Args;
use d0tb00t_c0re_lib::Settings;
use d0tb00t_c0re_lib::bootstrap::catalog::Scope;
use d0tb00t_c0re_lib::bootstrap::prereq::check_prerequisites;
use d0tb00t_c0re_lib::bootstrap::{Catalog, ProcessContext, Reporter};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Settings file (default: <config dir>/d0tb00t/config.toml)
    #[arg(long, env = "D0TB00T_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the catalog and exit without installing anything
    #[arg(long)]
    pub list: bool,
}

/// Settings, catalog and process context for one run.
pub struct Session {
    pub settings: Settings,
    pub catalog: Catalog,
    pub ctx: ProcessContext,
}

impl Session {
    pub fn load(args: &CommonArgs) -> Result<Self> {
        let settings =
            Settings::load(args.config.as_deref()).context("Failed to load settings")?;
        let catalog =
            Catalog::load(settings.catalog.as_deref()).context("Failed to load catalog")?;

        let mut ctx = ProcessContext::from_env(settings.system_manager);
        for dir in settings.extra_paths.iter().rev() {
            ctx.prepend_path(dir);
        }
        for (key, value) in &settings.env {
            ctx.set_env(key, value);
        }
        tracing::debug!(
            system_manager = %settings.system_manager,
            phases = catalog.phases.len(),
            fonts = catalog.fonts.entries.len(),
            "session loaded"
        );

        Ok(Self {
            settings,
            catalog,
            ctx,
        })
    }

    /// Abort before any installation work if a hard prerequisite is missing.
    pub fn ensure_prerequisites(&self, scope: Scope, reporter: &dyn Reporter) -> Result<()> {
        let specs = self.catalog.prerequisites_for(scope);
        let result = check_prerequisites(&specs, &self.ctx);

        for check in result.missing() {
            let mut line = if check.found {
                format!(
                    "{} {} does not satisfy {}",
                    check.name,
                    check.installed_version.as_deref().unwrap_or("unknown"),
                    check.required_version.as_deref().unwrap_or("*")
                )
            } else {
                format!("{} is required but not installed", check.name)
            };
            if let Some(hint) = &check.install_hint {
                let _ = write!(line, " (hint: {hint})");
            }
            reporter.error(&line);
        }

        match result.into_error() {
            Some(err) => Err(err).context("Missing prerequisites, nothing was installed"),
            None => Ok(()),
        }
    }
}
