//! Editor environment bootstrap
//!
//! Editor plugin, package managers and language servers, one phase at a
//! time, in catalog order.

use crate::commands::{CommonArgs, Session};
use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use d0tb00t_c0re_lib::Prompt;
use d0tb00t_c0re_lib::bootstrap::catalog::Scope;
use d0tb00t_c0re_lib::bootstrap::{
    Catalog, ConsoleReporter, Dispatcher, PathProbe, Reporter, StepRunner, print_completion,
};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "d0tb00t-env",
    version,
    about = "Install the editor plugin manager, package managers and language servers"
)]
pub struct EnvArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Catalog listing for `--list`.
pub fn print_catalog(catalog: &Catalog) {
    for phase in &catalog.phases {
        println!("{}:", phase.name);
        for target in &phase.targets {
            println!(
                "  {:<28} {:<17} {}",
                target.id,
                target.method.to_string(),
                target.description
            );
        }
        println!();
    }
}

pub async fn run_env(args: &EnvArgs, prompt: &dyn Prompt) -> Result<()> {
    let mut session = Session::load(&args.common)?;

    if args.common.list {
        print_catalog(&session.catalog);
        return Ok(());
    }

    let reporter = ConsoleReporter;
    reporter.banner("d0tb00t: editor environment bootstrap");
    for phase in &session.catalog.phases {
        reporter.info(&format!("{} ({} targets)", phase.name, phase.targets.len()));
    }

    if !prompt.confirm("Proceed with installation?")? {
        reporter.info("Cancelled, nothing was changed");
        return Ok(());
    }

    session.ensure_prerequisites(Scope::Env, &reporter)?;

    let started = Utc::now();
    let probe = PathProbe;
    let dispatcher = Dispatcher::system();
    let runner = StepRunner::new(&probe, &dispatcher, &reporter, prompt);

    let mut summaries = Vec::with_capacity(session.catalog.phases.len());
    for phase in &session.catalog.phases {
        summaries.push(runner.run_phase(phase, &mut session.ctx).await);
    }

    print_completion(&reporter, &summaries, started);
    Ok(())
}
