//! Integration tests for the `cl` binary.
//!
//! Global configuration lookups are pointed at an empty directory so the
//! developer's own settings cannot leak in.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::TestRepo;

struct Cl {
    home: TempDir,
}

impl Cl {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self, repo: &TestRepo) -> Command {
        let mut cmd = Command::cargo_bin("cl").unwrap();
        cmd.current_dir(repo.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path())
            .env_remove("CL_CONFIG")
            .env("USER", "tester")
            .arg("--no-interactive");
        cmd
    }
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("cl")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cl"));
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("cl")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mail"))
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("cleanup"));
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("cl")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_cl"));
}

#[test]
fn new_then_deps_prints_chain() {
    let repo = TestRepo::new();
    let cl = Cl::new();

    cl.cmd(&repo).args(["new", "feature1"]).assert().success();
    cl.cmd(&repo).args(["new", "feature2"]).assert().success();

    cl.cmd(&repo)
        .arg("deps")
        .assert()
        .success()
        .stdout("master\nfeature1\nfeature2\n");
    assert_eq!(repo.current_branch(), "feature2");
}

#[test]
fn sync_reports_merges() {
    let repo = TestRepo::new();
    let cl = Cl::new();
    cl.cmd(&repo).args(["new", "feature1"]).assert().success();
    repo.commit("one.txt", "one\n", "Add one");

    cl.cmd(&repo)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged master into feature1"));
}

#[test]
fn mail_dry_run_shows_refspec() {
    let repo = TestRepo::new();
    let cl = Cl::new();
    cl.cmd(&repo).args(["new", "feature1"]).assert().success();
    repo.commit("one.txt", "one\n", "Add one");

    cl.cmd(&repo)
        .args(["mail", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[dry run] would push feature1-REVIEW:refs/for/master to origin",
        ));
    assert_eq!(repo.current_branch(), "feature1");
    assert!(!repo.branch_exists("feature1-REVIEW"));
}

#[test]
fn mail_uploads_to_remote() {
    let repo = TestRepo::new();
    let cl = Cl::new();
    cl.cmd(&repo).args(["new", "feature1"]).assert().success();
    repo.commit("one.txt", "one\n", "Add one");

    cl.cmd(&repo)
        .args(["mail", "--set-topic=false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mailed feature1 to refs/for/master"));

    let uploaded = repo.remote_rev_parse("refs/for/master");
    assert_eq!(
        repo.remote_rev_parse(&format!("{}^{{tree}}", uploaded)),
        repo.rev_parse("feature1^{tree}")
    );
}

#[test]
fn mail_from_upstream_fails() {
    let repo = TestRepo::new();

    Cl::new()
        .cmd(&repo)
        .arg("mail")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("error: "))
        .stderr(predicate::str::contains(
            "cannot review from the remote-tracking branch master",
        ));
}

#[test]
fn cleanup_refuses_upstream() {
    let repo = TestRepo::new();

    Cl::new()
        .cmd(&repo)
        .args(["cleanup", "master"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("refusing to delete the upstream branch master"));
}

#[test]
fn outside_a_repository_fails() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("cl")
        .unwrap()
        .arg("--cwd")
        .arg(dir.path())
        .arg("sync")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_repo_config_is_reported() {
    let repo = TestRepo::new();
    repo.write(".git/cl/config.toml", "bogus = true\n");

    Cl::new()
        .cmd(&repo)
        .arg("deps")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn repo_config_sets_upstream() {
    let repo = TestRepo::new();
    repo.branch("develop");
    repo.write(".git/cl/config.toml", "upstream = \"develop\"\n");
    let cl = Cl::new();

    cl.cmd(&repo).args(["new", "feature1"]).assert().success();
    cl.cmd(&repo)
        .arg("deps")
        .assert()
        .success()
        .stdout("develop\nfeature1\n");
}

#[test]
fn declined_label_change_is_silent_success() {
    let repo = TestRepo::new();
    let cl = Cl::new();
    cl.cmd(&repo).args(["new", "feature1"]).assert().success();
    repo.commit("one.txt", "one\n", "Add one");
    cl.cmd(&repo)
        .args(["mail", "--set-topic=false"])
        .assert()
        .success();
    let uploaded = repo.remote_rev_parse("refs/for/master");

    cl.cmd(&repo)
        .args(["mail", "--set-topic=false", "--autosubmit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("autosubmit=false to autosubmit=true"))
        .stdout(predicate::str::contains("Mailed").not())
        .stderr(predicate::str::is_empty());

    assert_eq!(repo.remote_rev_parse("refs/for/master"), uploaded);
    assert_eq!(repo.current_branch(), "feature1");
}
