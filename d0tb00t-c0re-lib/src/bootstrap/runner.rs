//! Step runner
//!
//! Walks a phase one target at a time through
//! `Pending -> Probing -> {Skipped | Installing} -> {Verified | Unverified | Failed}`.
//! Every terminal outcome is recorded and the runner moves on; a single
//! target can never stop its phase.

use crate::bootstrap::catalog::{InstallPhase, InstallTarget};
use crate::bootstrap::context::ProcessContext;
use crate::bootstrap::installer::Dispatch;
use crate::bootstrap::probe::Probe;
use crate::bootstrap::report::Reporter;
use crate::error::InstallError;
use crate::prompt::Prompt;
use std::error::Error as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyInstalled,
    /// Ecosystem package manager (npm, go) absent.
    ManagerMissing(String),
    /// A binary the whole phase requires is absent.
    PrerequisiteMissing(String),
}

/// Terminal classification of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Verified,
    /// Installed, but the post-install probe cannot see it yet.
    Unverified,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StepState {
    Pending,
    Probing,
    Installing,
    Updating,
    Finished(Outcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub id: String,
    pub outcome: Outcome,
}

impl TargetRecord {
    pub fn new(id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            id: id.into(),
            outcome,
        }
    }
}

/// Outcomes of one phase, in catalog order.
#[derive(Debug, Clone)]
pub struct PhaseSummary {
    pub name: String,
    pub records: Vec<TargetRecord>,
}

impl PhaseSummary {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn verified(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Verified))
    }

    pub fn unverified(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unverified))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }
}

/// Error message including its source chain.
fn describe(err: &InstallError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub struct StepRunner<'a> {
    probe: &'a dyn Probe,
    dispatcher: &'a dyn Dispatch,
    reporter: &'a dyn Reporter,
    prompt: &'a dyn Prompt,
}

impl<'a> StepRunner<'a> {
    pub fn new(
        probe: &'a dyn Probe,
        dispatcher: &'a dyn Dispatch,
        reporter: &'a dyn Reporter,
        prompt: &'a dyn Prompt,
    ) -> Self {
        Self {
            probe,
            dispatcher,
            reporter,
            prompt,
        }
    }

    /// Run every target of `phase` in order.
    pub async fn run_phase(&self, phase: &InstallPhase, ctx: &mut ProcessContext) -> PhaseSummary {
        self.reporter.banner(&phase.name);

        if let Some(missing) = self.missing_requirement(phase, ctx) {
            self.reporter.warning(&format!(
                "Skipping {}: `{missing}` is not installed",
                phase.name
            ));
            return PhaseSummary {
                name: phase.name.clone(),
                records: phase
                    .targets
                    .iter()
                    .map(|t| {
                        TargetRecord::new(
                            t.id.clone(),
                            Outcome::Skipped(SkipReason::PrerequisiteMissing(missing.clone())),
                        )
                    })
                    .collect(),
            };
        }

        let mut records = Vec::with_capacity(phase.targets.len());
        for target in &phase.targets {
            records.push(self.run_target(target, ctx).await);
        }

        PhaseSummary {
            name: phase.name.clone(),
            records,
        }
    }

    fn missing_requirement<'p>(
        &self,
        phase: &'p InstallPhase,
        ctx: &ProcessContext,
    ) -> Option<&'p String> {
        phase
            .requires
            .iter()
            .find(|name| !self.probe.has_command(name, ctx))
    }

    /// Drive one target to a terminal outcome.
    pub async fn run_target(&self, target: &InstallTarget, ctx: &mut ProcessContext) -> TargetRecord {
        let mut state = StepState::Pending;
        let outcome = loop {
            tracing::debug!(id = %target.id, ?state, "step");
            state = match state {
                StepState::Pending => StepState::Probing,
                StepState::Probing => self.probe_target(target, ctx),
                StepState::Installing => self.install_target(target, ctx).await,
                StepState::Updating => self.update_target(target, ctx).await,
                StepState::Finished(outcome) => break outcome,
            };
        };

        tracing::info!(id = %target.id, ?outcome, "target done");
        TargetRecord::new(target.id.clone(), outcome)
    }

    fn probe_target(&self, target: &InstallTarget, ctx: &ProcessContext) -> StepState {
        let label = target.label();

        if self.probe.is_satisfied(target, ctx) {
            if target.updatable && self.ask_update(label) {
                return StepState::Updating;
            }
            self.reporter.success(&format!("{label} is already installed"));
            return StepState::Finished(Outcome::Skipped(SkipReason::AlreadyInstalled));
        }

        if let Some(manager) = target.method.ecosystem_manager() {
            if !self.probe.has_command(manager, ctx) {
                self.reporter.warning(&format!(
                    "{label}: `{manager}` not found, skipping (install {manager} and re-run)"
                ));
                return StepState::Finished(Outcome::Skipped(SkipReason::ManagerMissing(
                    manager.to_string(),
                )));
            }
        }

        self.reporter.info(&format!("Installing {label} via {}...", target.method));
        StepState::Installing
    }

    fn ask_update(&self, label: &str) -> bool {
        match self
            .prompt
            .confirm(&format!("{label} is already installed. Update it?"))
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "update prompt failed, treating as no");
                false
            }
        }
    }

    async fn install_target(&self, target: &InstallTarget, ctx: &mut ProcessContext) -> StepState {
        let label = target.label();
        match self.dispatcher.install(target, ctx).await {
            Ok(()) if self.probe.is_satisfied(target, ctx) => {
                self.reporter.success(&format!("{label} installed"));
                StepState::Finished(Outcome::Verified)
            }
            Ok(()) => {
                self.reporter.warning(&format!(
                    "{label} installed, but `{}` is not on PATH yet; restart your shell",
                    target.verify_name()
                ));
                StepState::Finished(Outcome::Unverified)
            }
            Err(e) => StepState::Finished(self.failed(label, &e)),
        }
    }

    async fn update_target(&self, target: &InstallTarget, ctx: &mut ProcessContext) -> StepState {
        let label = target.label();
        match self.dispatcher.update(target, ctx).await {
            Ok(()) => {
                self.reporter.success(&format!("{label} updated"));
                StepState::Finished(Outcome::Verified)
            }
            Err(e) => StepState::Finished(self.failed(label, &e)),
        }
    }

    fn failed(&self, label: &str, err: &InstallError) -> Outcome {
        let message = describe(err);
        match err.remediation() {
            Some(hint) => self
                .reporter
                .error(&format!("{label} failed: {message} (hint: {hint})")),
            None => self.reporter.error(&format!("{label} failed: {message}")),
        }
        Outcome::Failed(message)
    }
}
