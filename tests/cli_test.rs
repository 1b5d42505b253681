//! Integration tests for the provision binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A project directory plus a separate directory for backups and reports.
struct Sandbox {
    project: TempDir,
    state: TempDir,
}

impl Sandbox {
    fn new(config: &str) -> Self {
        let project = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let dir = project.path().join(".provision");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yml"), config).unwrap();
        Self { project, state }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.project.path().join(name)
    }

    fn reports_dir(&self) -> PathBuf {
        self.state.path().join("reports")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(cargo_bin("provision"));
        cmd.current_dir(self.project.path())
            .env("PROVISION_BACKUP_DIR", self.state.path().join("backups"))
            .env("PROVISION_REPORT_DIR", self.reports_dir())
            .env_remove("RUST_LOG")
            .arg("--non-interactive");
        cmd
    }

    fn reports(&self) -> Vec<PathBuf> {
        match fs::read_dir(self.reports_dir()) {
            Ok(dir) => dir.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

const MARKER_CONFIG: &str = r#"
app_name: Laptop
steps:
  marker:
    apply: touch installed.txt
    revert: rm installed.txt
    check:
      type: file_exists
      path: installed.txt
"#;

fn link_config(source: &Path, target: &Path) -> String {
    format!(
        "steps:\n  zshrc:\n    link:\n      source: {}\n      target: {}\n",
        source.display(),
        target.display()
    )
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("provision"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("reversible machine setup"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("provision"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn install_applies_and_writes_report() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(MARKER_CONFIG);

    sandbox
        .cmd()
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("Installing Laptop"))
        .stdout(predicate::str::contains("1 applied"));

    assert!(sandbox.path("installed.txt").exists());
    let reports = sandbox.reports();
    assert_eq!(reports.len(), 1);
    let name = reports[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with("-install.jsonl"));

    let content = fs::read_to_string(&reports[0])?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    let header: serde_json::Value = serde_json::from_str(lines[0])?;
    assert_eq!(header["direction"], "forward");
    let entry: serde_json::Value = serde_json::from_str(lines[1])?;
    assert_eq!(entry["step_id"], "marker");
    assert_eq!(entry["outcome"], "applied");
    Ok(())
}

#[test]
fn install_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(MARKER_CONFIG);
    sandbox.cmd().arg("install").assert().success();

    sandbox
        .cmd()
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 applied, 1 skipped"));
    Ok(())
}

#[test]
fn dry_run_changes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(MARKER_CONFIG);

    sandbox
        .cmd()
        .args(["install", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would touch installed.txt"))
        .stdout(predicate::str::contains("Dry run complete"));

    assert!(!sandbox.path("installed.txt").exists());
    assert!(sandbox.reports().is_empty());
    Ok(())
}

#[test]
fn link_install_and_cleanup_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let source = home.path().join("dotfiles-zshrc");
    let target = home.path().join(".zshrc");
    fs::write(&source, "new")?;
    fs::write(&target, "old")?;
    let sandbox = Sandbox::new(&link_config(&source, &target));

    sandbox.cmd().arg("install").assert().success();
    assert_eq!(fs::read_link(&target)?, source);

    sandbox
        .cmd()
        .args(["cleanup", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 reverted"));

    assert!(!fs::symlink_metadata(&target)?.file_type().is_symlink());
    assert_eq!(fs::read_to_string(&target)?, "old");
    Ok(())
}

#[test]
fn cleanup_without_yes_is_declined_non_interactively() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(MARKER_CONFIG);
    fs::write(sandbox.path("installed.txt"), "")?;

    sandbox
        .cmd()
        .env_remove("PROVISION_PROMPT_CLEANUP")
        .arg("cleanup")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nothing was changed"));

    assert!(sandbox.path("installed.txt").exists());
    Ok(())
}

#[test]
fn cleanup_prompt_can_be_answered_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(MARKER_CONFIG);
    fs::write(sandbox.path("installed.txt"), "")?;

    sandbox
        .cmd()
        .env("PROVISION_PROMPT_CLEANUP", "yes")
        .arg("cleanup")
        .assert()
        .success();

    assert!(!sandbox.path("installed.txt").exists());
    Ok(())
}

#[test]
fn cleanup_only_keeps_dependencies_other_steps_need() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = String::from("steps:\n");
    for (id, deps) in [("brew", "[]"), ("git", "[brew]"), ("zsh", "[brew]")] {
        config.push_str(&format!(
            "  {id}:\n    apply: touch {id}.txt\n    revert: rm {id}.txt\n    depends_on: {deps}\n    check:\n      type: file_exists\n      path: {id}.txt\n"
        ));
    }
    let sandbox = Sandbox::new(&config);
    sandbox.cmd().arg("install").assert().success();

    sandbox
        .cmd()
        .args(["cleanup", "--yes", "--only", "git"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 reverted"));

    assert!(!sandbox.path("git.txt").exists());
    assert!(sandbox.path("brew.txt").exists());
    assert!(sandbox.path("zsh.txt").exists());
    Ok(())
}

#[test]
fn cleanup_of_irreversible_step_fails() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new("steps:\n  brew:\n    apply: 'true'\n");

    sandbox
        .cmd()
        .args(["cleanup", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not reversible"));
    Ok(())
}

#[test]
fn failing_step_blocks_dependents() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(
        r#"
steps:
  f:
    apply: exit 1
  g:
    apply: touch g.txt
    depends_on: [f]
"#,
    );

    sandbox
        .cmd()
        .args(["install", "--stop-on-failure"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("blocked by 'f'"));

    assert!(!sandbox.path("g.txt").exists());
    Ok(())
}

#[test]
fn interactive_step_waits_without_confirmation() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(
        "steps:\n  ask:\n    apply: touch asked.txt\n    interactive: true\n",
    );

    sandbox
        .cmd()
        .env_remove("PROVISION_CONFIRM_ASK")
        .arg("install")
        .assert()
        .success()
        .stderr(predicate::str::contains("awaiting confirmation"));

    assert!(!sandbox.path("asked.txt").exists());
    Ok(())
}

#[test]
fn interactive_step_confirmed_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(
        "steps:\n  ask:\n    apply: touch asked.txt\n    interactive: true\n",
    );

    sandbox
        .cmd()
        .env("PROVISION_CONFIRM_ASK", "yes")
        .arg("install")
        .assert()
        .success();

    assert!(sandbox.path("asked.txt").exists());
    Ok(())
}

#[test]
fn missing_config_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = Command::new(cargo_bin("provision"));
    cmd.current_dir(temp.path()).args(["--non-interactive", "install"]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("No configuration found"));
    Ok(())
}

#[test]
fn cyclic_config_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(
        "steps:\n  a:\n    apply: x\n    depends_on: [b]\n  b:\n    apply: y\n    depends_on: [a]\n",
    );

    sandbox
        .cmd()
        .arg("install")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Circular dependency"));
    Ok(())
}

#[test]
fn config_flag_overrides_default_location() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new("steps: {}\n");
    let other = sandbox.path("other.yml");
    fs::write(&other, "steps:\n  elsewhere:\n    apply: 'true'\n")?;

    sandbox
        .cmd()
        .arg("--config")
        .arg(&other)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("elsewhere"));
    Ok(())
}

#[test]
fn list_shows_install_order() -> Result<(), Box<dyn std::error::Error>> {
    let sandbox = Sandbox::new(
        "steps:\n  git:\n    apply: 'true'\n    depends_on: [brew]\n  brew:\n    apply: 'true'\n",
    );

    sandbox
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)1\..*brew.*2\..*git")?);
    Ok(())
}

#[test]
fn backups_lists_what_install_moved_aside() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let source = home.path().join("src");
    let target = home.path().join("dest");
    fs::write(&source, "new")?;
    fs::write(&target, "old")?;
    let sandbox = Sandbox::new(&link_config(&source, &target));
    sandbox.cmd().arg("install").assert().success();

    sandbox
        .cmd()
        .arg("backups")
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains(".bak"));
    Ok(())
}

#[test]
fn completions_generate_for_bash() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("provision"));
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("provision"));
    Ok(())
}
