//! Operator-facing output
//!
//! [`Reporter`] is the stateless severity printer the step runner talks to.
//! The runner never looks at what a reporter did, so swapping the console
//! reporter for a recording one in tests changes nothing else.

use crate::bootstrap::runner::{Outcome, PhaseSummary, SkipReason};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::fmt::Write as _;

pub trait Reporter: Send + Sync {
    /// Section banner, e.g. at the start of a phase.
    fn banner(&self, title: &str);
    fn info(&self, msg: &str);
    fn success(&self, msg: &str);
    fn warning(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Color-coded, severity-tagged lines on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn banner(&self, title: &str) {
        println!();
        println!("{}", format!("━━━ {title} ━━━").cyan().bold());
    }

    fn info(&self, msg: &str) {
        println!("{} {msg}", "[INFO]".blue().bold());
    }

    fn success(&self, msg: &str) {
        println!("{} {msg}", "[ OK ]".green().bold());
    }

    fn warning(&self, msg: &str) {
        println!("{} {msg}", "[WARN]".yellow().bold());
    }

    fn error(&self, msg: &str) {
        println!("{} {msg}", "[FAIL]".red().bold());
    }
}

fn outcome_cell(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Skipped(SkipReason::AlreadyInstalled) => "✅ already installed".to_string(),
        Outcome::Skipped(SkipReason::ManagerMissing(manager)) => {
            format!("⏭️  skipped ({manager} not found)")
        }
        Outcome::Skipped(SkipReason::PrerequisiteMissing(name)) => {
            format!("⏭️  skipped ({name} not installed)")
        }
        Outcome::Verified => "✨ installed".to_string(),
        Outcome::Unverified => "⚠️  installed, not on PATH yet".to_string(),
        Outcome::Failed(reason) => format!("❌ failed: {reason}"),
    }
}

/// Plain-text summary of a whole run, one block per phase.
pub fn render_summary(summaries: &[PhaseSummary], started: DateTime<Utc>) -> String {
    let mut out = String::new();
    let elapsed = Utc::now().signed_duration_since(started);

    let _ = writeln!(out, "🥾 d0tb00t summary");
    let _ = writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let _ = writeln!(out, "Started: {}", started.to_rfc3339());
    let _ = writeln!(out, "Elapsed: {}s", elapsed.num_seconds());

    for summary in summaries {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "📦 {} ({} installed, {} skipped, {} unverified, {} failed)",
            summary.name,
            summary.verified(),
            summary.skipped(),
            summary.unverified(),
            summary.failed()
        );
        let width = summary
            .records
            .iter()
            .map(|r| r.id.len())
            .max()
            .unwrap_or(0);
        for record in &summary.records {
            let _ = writeln!(
                out,
                "  {:<width$}  {}",
                record.id,
                outcome_cell(&record.outcome)
            );
        }
    }

    out
}

/// Closing lines. Printed even when targets failed, so the per-target
/// status above is what tells the operator whether everything worked.
pub fn print_completion(reporter: &dyn Reporter, summaries: &[PhaseSummary], started: DateTime<Utc>) {
    println!();
    print!("{}", render_summary(summaries, started));

    let unverified: usize = summaries.iter().map(PhaseSummary::unverified).sum();
    let failed: usize = summaries.iter().map(PhaseSummary::failed).sum();

    reporter.banner("Done");
    if failed > 0 {
        reporter.warning(&format!(
            "{failed} target(s) failed; scroll up for the error and hint of each"
        ));
    }
    if unverified > 0 {
        reporter.warning(&format!(
            "{unverified} target(s) are installed but not on PATH yet; restart your shell"
        ));
    }
    reporter.success("Bootstrap finished");
}
