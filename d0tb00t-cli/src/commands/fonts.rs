//! Nerd Fonts installer
//!
//! Confirm, choose all or a subset, download and extract each font, then
//! refresh the font cache.

use crate::commands::{CommonArgs, Session};
use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use d0tb00t_c0re_lib::Prompt;
use d0tb00t_c0re_lib::bootstrap::catalog::{FontCatalog, Scope};
use d0tb00t_c0re_lib::bootstrap::fonts::{Selection, font_phase, parse_selection, refresh_font_cache};
use d0tb00t_c0re_lib::bootstrap::{
    ConsoleReporter, Dispatcher, DuctRunner, PathProbe, Reporter, StepRunner, print_completion,
};

#[derive(Debug, Parser, Clone)]
#[command(name = "d0tb00t-fonts", version, about = "Install Nerd Fonts for the terminal")]
pub struct FontsArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

fn print_fonts(fonts: &FontCatalog) {
    for (i, entry) in fonts.entries.iter().enumerate() {
        println!("  {}. {}", i + 1, entry.name);
    }
}

/// Ask which fonts to install. `None` means the operator quit.
fn choose(fonts: &FontCatalog, prompt: &dyn Prompt) -> Result<Option<Vec<usize>>> {
    let count = fonts.entries.len();
    if prompt.confirm(&format!("Install all {count} fonts?"))? {
        return Ok(Some((0..count).collect()));
    }

    println!();
    print_fonts(fonts);
    let Some(answer) =
        prompt.ask("Font numbers separated by spaces, 'a' for all, 'q' to quit: ")?
    else {
        return Ok(None);
    };

    Ok(match parse_selection(&answer, count) {
        Selection::All => Some((0..count).collect()),
        Selection::Quit => None,
        Selection::Indices(indices) => Some(indices),
    })
}

pub async fn run_fonts(args: &FontsArgs, prompt: &dyn Prompt) -> Result<()> {
    let mut session = Session::load(&args.common)?;
    let fonts = session.catalog.fonts.clone();
    let dest_root = session
        .settings
        .fonts_dir
        .clone()
        .unwrap_or_else(|| fonts.default_dest().to_string());

    if args.common.list {
        print_fonts(&fonts);
        return Ok(());
    }

    let reporter = ConsoleReporter;
    reporter.banner("d0tb00t: Nerd Fonts");
    reporter.info(&format!(
        "{} fonts from release {} available",
        fonts.entries.len(),
        fonts.release
    ));

    if !prompt.confirm(&format!("Install Nerd Fonts into {dest_root}?"))? {
        reporter.info("Cancelled, nothing was changed");
        return Ok(());
    }

    let Some(selected) = choose(&fonts, prompt)? else {
        reporter.info("Cancelled, nothing was changed");
        return Ok(());
    };
    if selected.is_empty() {
        reporter.warning("No valid font numbers given, nothing to install");
        return Ok(());
    }

    session.ensure_prerequisites(Scope::Fonts, &reporter)?;

    let started = Utc::now();
    let probe = PathProbe;
    let dispatcher = Dispatcher::system();
    let runner = StepRunner::new(&probe, &dispatcher, &reporter, prompt);

    let phase = font_phase(&fonts, &dest_root, &selected);
    let summary = runner.run_phase(&phase, &mut session.ctx).await;

    if summary.verified() + summary.unverified() > 0 {
        refresh_font_cache(&DuctRunner, &probe, &reporter, &session.ctx, &dest_root);
    }

    print_completion(&reporter, &[summary], started);
    Ok(())
}
