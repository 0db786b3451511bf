//! Method dispatcher
//!
//! Turns a catalog target into concrete acquisition work. Every [`Method`]
//! has one default action; per-target `extra_args`, `env` and `companions`
//! are layered on top of it.

use crate::bootstrap::catalog::{InstallTarget, Method};
use crate::bootstrap::context::ProcessContext;
use crate::bootstrap::probe::find_command;
use crate::bootstrap::skeleton::{discard_directory, prepare_destination};
use crate::config::SystemManagerPreference;
use crate::error::{
    DownloadFailedSnafu, ExtractionFailedSnafu, FilesystemSnafu, InstallCommandFailedSnafu,
    InstallError,
};
use async_trait::async_trait;
use snafu::ResultExt;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub stdin: Option<Vec<u8>>,
}

impl CommandLine {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn with_args(mut self, extra: &[String]) -> Self {
        self.args.extend(extra.iter().cloned());
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external commands. The seam the dispatcher is tested through.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &CommandLine, ctx: &ProcessContext) -> Result<(), InstallError>;
}

/// Runs commands for real, inheriting stdout/stderr so the operator sees
/// installer output as it happens.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuctRunner;

impl CommandRunner for DuctRunner {
    fn run(&self, command: &CommandLine, ctx: &ProcessContext) -> Result<(), InstallError> {
        tracing::info!(command = %command, "running");

        let mut expr = duct::cmd(command.program.as_str(), &command.args)
            .env("PATH", ctx.path_var());
        for (key, value) in ctx.env().iter().chain(&command.env) {
            expr = expr.env(key, value);
        }
        if let Some(input) = &command.stdin {
            expr = expr.stdin_bytes(input.clone());
        }

        expr.run().map(|_| ()).context(InstallCommandFailedSnafu {
            command: command.to_string(),
        })
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, InstallError>;
}

#[derive(Debug, Default, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, InstallError> {
        tracing::info!(url, "downloading");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .context(DownloadFailedSnafu { url })?;
        let bytes = response.bytes().await.context(DownloadFailedSnafu { url })?;
        Ok(bytes.to_vec())
    }
}

/// Acquisition of a single target.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Install `target`. On success any search path entries it declares are
    /// applied to `ctx`.
    async fn install(
        &self,
        target: &InstallTarget,
        ctx: &mut ProcessContext,
    ) -> Result<(), InstallError>;

    /// Bring an already present target up to date.
    async fn update(
        &self,
        target: &InstallTarget,
        ctx: &mut ProcessContext,
    ) -> Result<(), InstallError>;
}

/// Host package managers `system` targets can go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemManager {
    Brew,
    Apt,
    Dnf,
    Pacman,
}

impl SystemManager {
    const PROBE_ORDER: [(Self, &'static str); 4] = [
        (Self::Brew, "brew"),
        (Self::Apt, "apt-get"),
        (Self::Dnf, "dnf"),
        (Self::Pacman, "pacman"),
    ];

    /// Resolve the preference against the context's current search path, so
    /// a manager installed earlier in the same run is picked up.
    pub fn resolve(ctx: &ProcessContext) -> Option<Self> {
        match ctx.system_manager() {
            SystemManagerPreference::Brew => Some(Self::Brew),
            SystemManagerPreference::Apt => Some(Self::Apt),
            SystemManagerPreference::Dnf => Some(Self::Dnf),
            SystemManagerPreference::Pacman => Some(Self::Pacman),
            SystemManagerPreference::Auto => Self::PROBE_ORDER
                .iter()
                .find(|(_, binary)| find_command(binary, ctx).is_some())
                .map(|(manager, _)| *manager),
        }
    }

    fn install_command(self, package: &str) -> CommandLine {
        match self {
            Self::Brew => CommandLine::new("brew", ["install", package]),
            Self::Apt => CommandLine::new("sudo", ["apt-get", "install", "-y", package]),
            Self::Dnf => CommandLine::new("sudo", ["dnf", "install", "-y", package]),
            Self::Pacman => {
                CommandLine::new("sudo", ["pacman", "-S", "--noconfirm", "--needed", package])
            }
        }
    }
}

/// Build the command line for every method that is a single invocation.
/// Download-based methods (`script`, `archive`) are handled by the
/// dispatcher itself.
pub fn command_for(
    target: &InstallTarget,
    dest: Option<&Path>,
    system: Option<SystemManager>,
) -> Result<CommandLine, InstallError> {
    let reference = target.reference.as_str();
    let command = match target.method {
        Method::System => {
            let manager = system.ok_or_else(|| InstallError::Unsupported {
                id: target.id.clone(),
                reason: "no system package manager found (brew, apt-get, dnf, pacman)".into(),
            })?;
            manager.install_command(reference).with_args(&target.extra_args)
        }
        Method::Pipx => CommandLine::new("pipx", ["install", reference]).with_args(&target.extra_args),
        Method::Cargo => {
            CommandLine::new("cargo", ["install", reference]).with_args(&target.extra_args)
        }
        Method::RustupComponent => CommandLine::new("rustup", ["component", "add", reference])
            .with_args(&target.extra_args),
        Method::Npm => CommandLine::new("npm", ["install", "-g", reference])
            .with_args(&target.companions)
            .with_args(&target.extra_args),
        Method::Go => CommandLine::new("go", ["install", reference]).with_args(&target.extra_args),
        Method::Git => {
            let dest = dest.ok_or_else(|| missing_dest(target))?;
            CommandLine::new("git", ["clone", "--depth", "1"])
                .with_args(&target.extra_args)
                .with_args(&[reference.to_string(), dest.to_string_lossy().into_owned()])
        }
        Method::Script | Method::Archive => {
            return Err(InstallError::Unsupported {
                id: target.id.clone(),
                reason: format!("{} targets are downloaded, not run", target.method),
            });
        }
    };

    Ok(CommandLine {
        env: target.env.clone(),
        ..command
    })
}

fn missing_dest(target: &InstallTarget) -> InstallError {
    InstallError::Unsupported {
        id: target.id.clone(),
        reason: format!("{} targets need a `dest`", target.method),
    }
}

/// The production dispatcher, generic over how commands run and how
/// downloads happen.
pub struct Dispatcher<R, F> {
    runner: R,
    fetcher: F,
}

impl Dispatcher<DuctRunner, HttpFetcher> {
    pub fn system() -> Self {
        Self::new(DuctRunner, HttpFetcher::default())
    }
}

impl<R: CommandRunner, F: Fetcher> Dispatcher<R, F> {
    pub fn new(runner: R, fetcher: F) -> Self {
        Self { runner, fetcher }
    }

    async fn run_script(
        &self,
        target: &InstallTarget,
        ctx: &ProcessContext,
    ) -> Result<(), InstallError> {
        let script = self.fetcher.fetch(&target.reference).await?;
        let mut command = CommandLine::new("bash", ["-s", "--"]).with_args(&target.extra_args);
        command.env = target.env.clone();
        command.stdin = Some(script);
        self.runner.run(&command, ctx)
    }

    async fn install_archive(
        &self,
        target: &InstallTarget,
        ctx: &ProcessContext,
    ) -> Result<(), InstallError> {
        let dest = target
            .dest
            .as_deref()
            .map(|d| ctx.expand(d))
            .ok_or_else(|| missing_dest(target))?;
        prepare_destination(&dest)?;

        let bytes = self.fetcher.fetch(&target.reference).await?;
        let artifact = artifact_path(&dest);
        std::fs::write(&artifact, &bytes).context(FilesystemSnafu { path: &artifact })?;

        let existed = dest.exists();
        let result = extract_zip(&artifact, &dest);

        if let Err(e) = std::fs::remove_file(&artifact) {
            tracing::warn!(path = %artifact.display(), error = %e, "could not remove download");
        }
        if result.is_err() && !existed && dest.exists() {
            discard_directory(&dest);
        }
        result
    }
}

/// Download location for an archive, next to its destination.
fn artifact_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".zip.part");
    dest.with_file_name(name)
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), InstallError> {
    let file = std::fs::File::open(archive).context(FilesystemSnafu { path: archive })?;
    let mut zip = zip::ZipArchive::new(file).context(ExtractionFailedSnafu { archive })?;
    zip.extract(dest).context(ExtractionFailedSnafu { archive })?;
    tracing::debug!(archive = %archive.display(), files = zip.len(), "extracted");
    Ok(())
}

#[async_trait]
impl<R: CommandRunner, F: Fetcher> Dispatch for Dispatcher<R, F> {
    async fn install(
        &self,
        target: &InstallTarget,
        ctx: &mut ProcessContext,
    ) -> Result<(), InstallError> {
        match target.method {
            Method::Script => self.run_script(target, ctx).await?,
            Method::Archive => self.install_archive(target, ctx).await?,
            Method::Git => {
                let dest = target.dest.as_deref().map(|d| ctx.expand(d));
                if let Some(dest) = &dest {
                    prepare_destination(dest)?;
                }
                let command = command_for(target, dest.as_deref(), None)?;
                self.runner.run(&command, ctx)?;
            }
            Method::System => {
                let manager = SystemManager::resolve(ctx);
                tracing::debug!(id = %target.id, ?manager, "system package manager");
                self.runner.run(&command_for(target, None, manager)?, ctx)?;
            }
            Method::Pipx | Method::Cargo | Method::RustupComponent | Method::Npm | Method::Go => {
                self.runner.run(&command_for(target, None, None)?, ctx)?;
            }
        }

        // Later targets must resolve what this one just put on disk.
        for dir in target.paths.iter().rev() {
            ctx.prepend_path(dir);
        }
        Ok(())
    }

    async fn update(
        &self,
        target: &InstallTarget,
        ctx: &mut ProcessContext,
    ) -> Result<(), InstallError> {
        match target.method {
            Method::Git => {
                let dest = target
                    .dest
                    .as_deref()
                    .map(|d| ctx.expand(d))
                    .ok_or_else(|| missing_dest(target))?;
                let command = CommandLine::new(
                    "git",
                    [
                        "-C".to_string(),
                        dest.to_string_lossy().into_owned(),
                        "pull".to_string(),
                        "--ff-only".to_string(),
                    ],
                );
                self.runner.run(&command, ctx)
            }
            _ => Err(InstallError::Unsupported {
                id: target.id.clone(),
                reason: format!("{} targets have no update path", target.method),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<CommandLine>>,
        fail: bool,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &CommandLine, _ctx: &ProcessContext) -> Result<(), InstallError> {
            self.commands.lock().unwrap().push(command.clone());
            if self.fail {
                return Err(std::io::Error::other("exit status: 1")).context(
                    InstallCommandFailedSnafu {
                        command: command.to_string(),
                    },
                );
            }
            Ok(())
        }
    }

    impl RecordingRunner {
        fn recorded(&self) -> Vec<String> {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .map(ToString::to_string)
                .collect()
        }
    }

    struct StaticFetcher(Vec<u8>);

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, InstallError> {
            Ok(self.0.clone())
        }
    }

    fn zip_with(name: &str, contents: &[u8]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file(name, options).unwrap();
        writer.write_all(contents).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[cfg(unix)]
    #[test]
    fn test_duct_runner_passes_context_env() {
        let mut ctx = ProcessContext::new(
            "/nonexistent",
            vec![PathBuf::from("/bin"), PathBuf::from("/usr/bin")],
        );
        let check = CommandLine::new("sh", ["-c", "test \"$D0TB00T_MIRROR\" = internal"]);

        assert!(DuctRunner.run(&check, &ctx).is_err());
        ctx.set_env("D0TB00T_MIRROR", "internal");
        DuctRunner.run(&check, &ctx).unwrap();
    }

    #[test]
    fn test_extra_args_layer_on_method_default() {
        let mut target = InstallTarget::new("taplo-cli", Method::Cargo, "taplo-cli");
        target.extra_args = vec!["--locked".into(), "--features".into(), "lsp".into()];

        let command = command_for(&target, None, None).unwrap();
        assert_eq!(
            command.to_string(),
            "cargo install taplo-cli --locked --features lsp"
        );
    }

    #[test]
    fn test_npm_companions_share_one_invocation() {
        let mut target = InstallTarget::new(
            "typescript-language-server",
            Method::Npm,
            "typescript-language-server",
        );
        assert_eq!(
            command_for(&target, None, None).unwrap().to_string(),
            "npm install -g typescript-language-server"
        );

        target.companions = vec!["typescript".into()];
        assert_eq!(
            command_for(&target, None, None).unwrap().to_string(),
            "npm install -g typescript-language-server typescript"
        );
    }

    #[test]
    fn test_system_commands_per_manager() {
        let target = InstallTarget::new("clangd", Method::System, "clangd");
        let cases = [
            (SystemManager::Brew, "brew install clangd"),
            (SystemManager::Apt, "sudo apt-get install -y clangd"),
            (SystemManager::Dnf, "sudo dnf install -y clangd"),
            (
                SystemManager::Pacman,
                "sudo pacman -S --noconfirm --needed clangd",
            ),
        ];
        for (manager, expected) in cases {
            assert_eq!(
                command_for(&target, None, Some(manager)).unwrap().to_string(),
                expected
            );
        }
        assert!(matches!(
            command_for(&target, None, None),
            Err(InstallError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_explicit_system_preference_wins() {
        let mut ctx = ProcessContext::new("/nonexistent", vec![]);
        assert_eq!(SystemManager::resolve(&ctx), None);

        ctx = ProcessContext::from_env(SystemManagerPreference::Pacman);
        assert_eq!(SystemManager::resolve(&ctx), Some(SystemManager::Pacman));
    }

    #[tokio::test]
    async fn test_script_is_piped_to_shell_and_paths_applied() {
        let runner = RecordingRunner::default();
        let dispatcher = Dispatcher::new(runner, StaticFetcher(b"echo hi".to_vec()));
        let mut target = InstallTarget::new("rustup", Method::Script, "https://sh.rustup.rs");
        target.extra_args = vec!["-y".into()];
        target.paths = vec!["~/.cargo/bin".into()];
        let mut ctx = ProcessContext::new("/home/tester", vec![PathBuf::from("/usr/bin")]);

        dispatcher.install(&target, &mut ctx).await.unwrap();

        let commands = dispatcher.runner.commands.lock().unwrap().clone();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].to_string(), "bash -s -- -y");
        assert_eq!(commands[0].stdin.as_deref(), Some(b"echo hi".as_slice()));
        assert_eq!(ctx.search_path()[0], PathBuf::from("/home/tester/.cargo/bin"));
    }

    #[tokio::test]
    async fn test_failed_command_leaves_path_untouched() {
        let runner = RecordingRunner {
            fail: true,
            ..RecordingRunner::default()
        };
        let dispatcher = Dispatcher::new(runner, StaticFetcher(Vec::new()));
        let mut target = InstallTarget::new("ruff", Method::Pipx, "ruff");
        target.paths = vec!["~/.local/bin".into()];
        let mut ctx = ProcessContext::new("/home/tester", vec![]);

        let err = dispatcher.install(&target, &mut ctx).await.unwrap_err();
        assert!(matches!(err, InstallError::InstallCommandFailed { .. }));
        assert!(ctx.search_path().is_empty());
    }

    #[tokio::test]
    async fn test_archive_extracts_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("fonts/Hack");
        let dispatcher = Dispatcher::new(
            RecordingRunner::default(),
            StaticFetcher(zip_with("HackNerdFont-Regular.ttf", b"font")),
        );
        let mut target = InstallTarget::new("Hack", Method::Archive, "https://example.invalid/Hack.zip");
        target.dest = Some(dest.to_string_lossy().into_owned());
        let mut ctx = ProcessContext::new(root.path(), vec![]);

        dispatcher.install(&target, &mut ctx).await.unwrap();

        assert!(dest.join("HackNerdFont-Regular.ttf").is_file());
        assert!(!root.path().join("fonts/Hack.zip.part").exists());
        assert!(dispatcher.runner.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_archive_fails_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("fonts/Meslo");
        let dispatcher = Dispatcher::new(
            RecordingRunner::default(),
            StaticFetcher(b"this is not a zip".to_vec()),
        );
        let mut target = InstallTarget::new("Meslo", Method::Archive, "https://example.invalid/Meslo.zip");
        target.dest = Some(dest.to_string_lossy().into_owned());
        let mut ctx = ProcessContext::new(root.path(), vec![]);

        let err = dispatcher.install(&target, &mut ctx).await.unwrap_err();

        assert!(matches!(err, InstallError::ExtractionFailed { .. }));
        assert!(!root.path().join("fonts/Meslo.zip.part").exists());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_git_clone_and_update_commands() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("pack/packer.nvim");
        let dispatcher = Dispatcher::new(RecordingRunner::default(), StaticFetcher(Vec::new()));
        let mut target = InstallTarget::new(
            "packer.nvim",
            Method::Git,
            "https://github.com/wbthomason/packer.nvim",
        );
        target.dest = Some(dest.to_string_lossy().into_owned());
        let mut ctx = ProcessContext::new(root.path(), vec![]);

        dispatcher.install(&target, &mut ctx).await.unwrap();
        dispatcher.update(&target, &mut ctx).await.unwrap();

        let recorded = dispatcher.runner.recorded();
        assert_eq!(
            recorded[0],
            format!(
                "git clone --depth 1 https://github.com/wbthomason/packer.nvim {}",
                dest.display()
            )
        );
        assert_eq!(
            recorded[1],
            format!("git -C {} pull --ff-only", dest.display())
        );
        assert!(root.path().join("pack").is_dir());
    }

    #[tokio::test]
    async fn test_update_unsupported_for_package_targets() {
        let dispatcher = Dispatcher::new(RecordingRunner::default(), StaticFetcher(Vec::new()));
        let target = InstallTarget::new("gopls", Method::Go, "golang.org/x/tools/gopls@latest");
        let mut ctx = ProcessContext::new("/nonexistent", vec![]);
        assert!(matches!(
            dispatcher.update(&target, &mut ctx).await,
            Err(InstallError::Unsupported { .. })
        ));
    }
}
