use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// Command isolated from the real home, config and settings file.
fn isolated(bin: &str, home: &Path) -> Command {
    let mut cmd = Command::cargo_bin(bin).unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("D0TB00T_CONFIG")
        .env_remove("D0TB00T_LOG")
        .env_remove("D0TB00T_DEBUG");
    cmd
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

#[test]
fn test_env_decline_exits_cleanly_without_side_effects() {
    let home = tempfile::tempdir().unwrap();

    isolated("d0tb00t-env", home.path())
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled, nothing was changed"));

    assert!(is_empty_dir(home.path()));
}

#[test]
fn test_env_end_of_input_counts_as_decline() {
    let home = tempfile::tempdir().unwrap();

    isolated("d0tb00t-env", home.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));

    assert!(is_empty_dir(home.path()));
}

#[test]
fn test_env_list_prints_catalog() {
    let home = tempfile::tempdir().unwrap();

    isolated("d0tb00t-env", home.path())
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Editor plugin:"))
        .stdout(predicate::str::contains("packer.nvim"))
        .stdout(predicate::str::contains("taplo-cli"))
        .stdout(predicate::str::contains("rustup-component"));
}

#[test]
fn test_fonts_decline_exits_cleanly_without_side_effects() {
    let home = tempfile::tempdir().unwrap();

    isolated("d0tb00t-fonts", home.path())
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled, nothing was changed"));

    assert!(is_empty_dir(home.path()));
}

#[test]
fn test_fonts_quit_at_selection_prompt() {
    let home = tempfile::tempdir().unwrap();

    isolated("d0tb00t-fonts", home.path())
        .write_stdin("y\nn\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. JetBrains Mono Nerd Font"))
        .stdout(predicate::str::contains("Cancelled, nothing was changed"));

    assert!(is_empty_dir(home.path()));
}

#[test]
fn test_fonts_out_of_range_selection_installs_nothing() {
    let home = tempfile::tempdir().unwrap();

    isolated("d0tb00t-fonts", home.path())
        .write_stdin("y\nn\n9\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to install"));

    assert!(is_empty_dir(home.path()));
}

#[test]
fn test_fonts_list() {
    let home = tempfile::tempdir().unwrap();

    isolated("d0tb00t-fonts", home.path())
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("3. Hack Nerd Font"))
        .stdout(predicate::str::contains("5. Caskaydia Cove Nerd Font"));
}

#[test]
fn test_missing_config_file_is_fatal() {
    let home = tempfile::tempdir().unwrap();

    isolated("d0tb00t-env", home.path())
        .arg("--config")
        .arg(home.path().join("missing.toml"))
        .write_stdin("n\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load settings"));
}

#[test]
fn test_config_can_point_at_another_catalog() {
    let home = tempfile::tempdir().unwrap();
    let catalog = home.path().join("catalog.toml");
    std::fs::write(
        &catalog,
        r#"
[[phases]]
name = "Just one"

[[phases.targets]]
id = "marksman"
method = "system"
reference = "marksman"
description = "Markdown"

[fonts]
release = "v0"
base_url = "https://example.invalid"
"#,
    )
    .unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, format!("catalog = {:?}\n", catalog.display().to_string())).unwrap();

    isolated("d0tb00t-env", home.path())
        .env("D0TB00T_CONFIG", &config)
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Just one:"))
        .stdout(predicate::str::contains("marksman"))
        .stdout(predicate::str::contains("packer.nvim").not());
}

const TWO_PHASES: &str = r#"
[[phases]]
name = "Editor plugin"
requires = ["git"]

[[phases.targets]]
id = "packer.nvim"
method = "git"
reference = "https://github.com/wbthomason/packer.nvim"
dest = "~/.local/share/nvim/site/pack/packer/start/packer.nvim"

[[phases]]
name = "Package managers"

[[phases.targets]]
id = "bash-language-server"
method = "npm"
reference = "bash-language-server"

[fonts]
release = "v0"
base_url = "https://example.invalid"
"#;

fn write_config(home: &Path, catalog: &str) -> std::path::PathBuf {
    let catalog_path = home.join("catalog.toml");
    std::fs::write(&catalog_path, catalog).unwrap();
    let config = home.join("config.toml");
    std::fs::write(
        &config,
        format!("catalog = {:?}\n", catalog_path.display().to_string()),
    )
    .unwrap();
    config
}

#[test]
fn test_missing_git_only_skips_the_phase_that_needs_it() {
    let home = tempfile::tempdir().unwrap();
    let empty_bin = tempfile::tempdir().unwrap();
    let config = write_config(home.path(), TWO_PHASES);

    isolated("d0tb00t-env", home.path())
        .env("PATH", empty_bin.path())
        .env("D0TB00T_CONFIG", &config)
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Skipping Editor plugin: `git` is not installed",
        ))
        .stdout(predicate::str::contains("━━━ Package managers ━━━"))
        .stdout(predicate::str::contains("`npm` not found"));

    assert!(!home.path().join(".local").exists());
}

#[test]
fn test_catalog_prerequisite_still_aborts_before_any_phase() {
    let home = tempfile::tempdir().unwrap();
    let empty_bin = tempfile::tempdir().unwrap();
    let catalog = format!(
        r#"
[[prerequisites]]
name = "definitely-not-installed-d0tb00t"
scope = "env"
install_hint = "install it first"
{TWO_PHASES}"#
    );
    let config = write_config(home.path(), &catalog);

    isolated("d0tb00t-env", home.path())
        .env("PATH", empty_bin.path())
        .env("D0TB00T_CONFIG", &config)
        .write_stdin("y\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("hint: install it first"))
        .stdout(predicate::str::contains("━━━ Editor plugin ━━━").not())
        .stderr(predicate::str::contains("Missing prerequisites"));
}
