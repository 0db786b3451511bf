//! Hard prerequisite checker
//!
//! Validates that the binaries an entry point cannot work without are
//! installed, with a matching version where the catalog asks for one.

use crate::bootstrap::catalog::PrerequisiteSpec;
use crate::bootstrap::context::ProcessContext;
use crate::bootstrap::probe::find_command;
use crate::error::InstallError;
use std::path::Path;

/// Result of prerequisite check for a single binary
#[derive(Debug)]
pub struct BinaryCheck {
    pub name: String,
    pub found: bool,
    pub installed_version: Option<String>,
    pub required_version: Option<String>,
    pub meets_requirement: bool,
    pub install_hint: Option<String>,
}

impl BinaryCheck {
    pub fn is_ok(&self) -> bool {
        self.found && self.meets_requirement
    }
}

/// Overall prerequisite check result
#[derive(Debug)]
pub struct PrereqResult {
    pub checks: Vec<BinaryCheck>,
}

impl PrereqResult {
    pub fn missing(&self) -> Vec<&BinaryCheck> {
        self.checks.iter().filter(|c| !c.is_ok()).collect()
    }

    /// First failing check as the fatal error value.
    pub fn into_error(self) -> Option<InstallError> {
        self.checks
            .into_iter()
            .find(|c| !c.is_ok())
            .map(|c| InstallError::PrerequisiteMissing {
                name: c.name,
                hint: c.install_hint,
            })
    }
}

/// Get version of binary by running `<binary> --version`. Some tools
/// (fc-cache) print it on stderr.
fn get_version(binary: &Path, ctx: &ProcessContext) -> Option<String> {
    let output = duct::cmd(binary, ["--version"])
        .env("PATH", ctx.path_var())
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    extract_version(&String::from_utf8_lossy(&output.stdout))
        .or_else(|| extract_version(&String::from_utf8_lossy(&output.stderr)))
}

/// Extract semantic version from version output
/// Handles various formats:
///   "git version 2.34.1" -> "2.34.1"
///   "fontconfig version 2.14.0" -> "2.14.0"
///   "v3.2.1" -> "3.2.1"
fn extract_version(output: &str) -> Option<String> {
    let re = regex::Regex::new(r"v?(\d+\.\d+\.\d+)").ok()?;
    re.captures(output)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check if installed version meets a semver requirement like ">=2.0.0".
fn version_meets_requirement(installed: &str, requirement: &str) -> bool {
    let Ok(installed) = semver::Version::parse(installed.trim()) else {
        return false;
    };
    semver::VersionReq::parse(requirement.trim()).is_ok_and(|req| req.matches(&installed))
}

fn check_binary(spec: &PrerequisiteSpec, ctx: &ProcessContext) -> BinaryCheck {
    let path = find_command(&spec.name, ctx);
    let found = path.is_some();

    let (installed_version, meets_requirement) = match (path.as_deref(), spec.version.as_deref()) {
        (None, _) => (None, false),
        (Some(binary), None) => (get_version(binary, ctx), true),
        (Some(binary), Some(requirement)) => match get_version(binary, ctx) {
            Some(version) => {
                let meets = version_meets_requirement(&version, requirement);
                (Some(version), meets)
            }
            // 🤓 Binary found but version unknown - assume OK
            None => (None, true),
        },
    };

    tracing::debug!(
        name = %spec.name,
        found,
        version = ?installed_version,
        meets_requirement,
        "prerequisite checked"
    );

    BinaryCheck {
        name: spec.name.clone(),
        found,
        installed_version,
        required_version: spec.version.clone(),
        meets_requirement,
        install_hint: spec.install_hint.clone(),
    }
}

/// Check every prerequisite in `specs` against the context's search path.
pub fn check_prerequisites(specs: &[&PrerequisiteSpec], ctx: &ProcessContext) -> PrereqResult {
    PrereqResult {
        checks: specs.iter().map(|spec| check_binary(spec, ctx)).collect(),
    }
}
