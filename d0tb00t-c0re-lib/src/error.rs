//! Per-target error taxonomy
//!
//! Everything here is caught by the step runner and downgraded to a recorded
//! outcome. Only [`InstallError::PrerequisiteMissing`] escapes to the entry
//! point, and only for hard prerequisites.

use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InstallError {
    #[snafu(display("required tool `{name}` is not available{}", hint_suffix(hint)))]
    PrerequisiteMissing { name: String, hint: Option<String> },

    #[snafu(display("download of {url} failed"))]
    DownloadFailed { url: String, source: reqwest::Error },

    #[snafu(display("could not extract {}", archive.display()))]
    ExtractionFailed {
        archive: PathBuf,
        source: zip::result::ZipError,
    },

    #[snafu(display("`{command}` failed"))]
    InstallCommandFailed {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("filesystem error at {}", path.display()))]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("{id} cannot be installed: {reason}"))]
    Unsupported { id: String, reason: String },
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!(" ({h})"))
        .unwrap_or_default()
}

impl InstallError {
    /// Remediation hint shown next to the error line, when one applies.
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::PrerequisiteMissing { hint, .. } => hint.as_deref(),
            Self::DownloadFailed { .. } => Some("check your network connection and retry"),
            Self::InstallCommandFailed { .. } => Some("re-run the command by hand to see its output"),
            Self::ExtractionFailed { .. } => Some("the archive may be truncated; retry the download"),
            Self::Filesystem { .. } | Self::Unsupported { .. } => None,
        }
    }
}
