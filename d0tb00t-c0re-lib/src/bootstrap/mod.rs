//! Bootstrap module for the editor development environment
//!
//! - Catalog of install targets (plugin, package managers, language servers, fonts)
//! - Existence probing against a process-wide context
//! - Method dispatch (downloads, package managers, toolchain installers)
//! - Step runner with per-target failure isolation
//! - Operator-facing reporting

pub mod catalog;
pub mod context;
pub mod fonts;
pub mod installer;
pub mod prereq;
pub mod probe;
pub mod report;
pub mod runner;
pub mod skeleton;

pub use catalog::{Catalog, InstallPhase, InstallTarget, Method, Scope};
pub use context::ProcessContext;
pub use installer::{Dispatch, Dispatcher, DuctRunner};
pub use prereq::check_prerequisites;
pub use probe::{PathProbe, Probe};
pub use report::{ConsoleReporter, Reporter, print_completion};
pub use runner::{Outcome, PhaseSummary, SkipReason, StepRunner};
