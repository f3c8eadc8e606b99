//! Shared fixtures for integration tests.
//!
//! Every test gets a real repository on `master` with one commit, a bare
//! `origin` it was pushed to, and a `commit-msg` hook that appends a
//! Change-Id the way Gerrit's does.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use clchain::core::config::Config;
use clchain::core::metadata::DependencyRecord;
use clchain::core::types::BranchName;
use clchain::engine::{Context, Session};
use clchain::git::Git;

const COMMIT_MSG_HOOK: &str = "#!/bin/sh\n\
if ! grep -q '^Change-Id:' \"$1\"; then\n\
  printf '\\nChange-Id: I%s\\n' \"$(git hash-object -t blob \"$1\")\" >> \"$1\"\n\
fi\n";

/// A working repository plus its bare remote.
pub struct TestRepo {
    dir: TempDir,
    remote: TempDir,
}

impl TestRepo {
    /// Repository on `master` with an initial commit, pushed to `origin`.
    pub fn new() -> Self {
        let remote = TempDir::new().expect("failed to create remote dir");
        run_git(remote.path(), &["init", "-q", "--bare", "-b", "master"]);

        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "-q", "-b", "master"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        // Prevent git from opening editors during tests
        run_git(dir.path(), &["config", "core.editor", "true"]);

        let repo = Self { dir, remote };
        repo.install_commit_msg_hook();
        repo.commit("README.md", "# Test Repo\n", "Initial commit");

        let url = repo.remote_path().to_string_lossy().into_owned();
        repo.git_cmd(&["remote", "add", "origin", &url]);
        repo.git_cmd(&["push", "-q", "-u", "origin", "master"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn remote_path(&self) -> &Path {
        self.remote.path()
    }

    pub fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    /// Session with built-in defaults: remote `origin`, upstream `master`.
    pub fn session(&self) -> Session {
        Session::with_config(self.git(), Config::default()).expect("failed to open session")
    }

    /// Non-interactive, quiet context rooted at the repository.
    pub fn context(&self) -> Context {
        Context {
            cwd: Some(self.path().to_path_buf()),
            debug: false,
            quiet: true,
            interactive: false,
            verify: true,
        }
    }

    pub fn install_commit_msg_hook(&self) {
        let hook = self.path().join(".git/hooks/commit-msg");
        std::fs::create_dir_all(hook.parent().unwrap()).unwrap();
        std::fs::write(&hook, COMMIT_MSG_HOOK).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    pub fn remove_commit_msg_hook(&self) {
        std::fs::remove_file(self.path().join(".git/hooks/commit-msg")).unwrap();
    }

    /// Write `content` to `filename` and commit it.
    pub fn commit(&self, filename: &str, content: &str, message: &str) {
        self.write(filename, content);
        self.git_cmd(&["add", filename]);
        self.git_cmd(&["commit", "-q", "-m", message]);
    }

    pub fn write(&self, filename: &str, content: &str) {
        let path = self.path().join(filename);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, filename: &str) -> String {
        std::fs::read_to_string(self.path().join(filename)).unwrap()
    }

    /// Create `name` at HEAD and check it out.
    pub fn branch(&self, name: &str) {
        self.git_cmd(&["checkout", "-q", "-b", name]);
    }

    pub fn checkout(&self, name: &str) {
        self.git_cmd(&["checkout", "-q", name]);
    }

    /// Record `ancestors` as the chain of `branch`.
    pub fn record(&self, branch: &str, ancestors: &[&str]) {
        let record = DependencyRecord::new(ancestors.iter().map(|a| b(a)).collect());
        self.session()
            .store
            .write_dependencies(&b(branch), &record)
            .expect("failed to write record");
    }

    pub fn current_branch(&self) -> String {
        self.git_output(&["branch", "--show-current"])
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{}", name)])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed")
            .status
            .success()
    }

    /// Local branches, sorted.
    pub fn branches(&self) -> Vec<String> {
        let out = self.git_output(&["for-each-ref", "--format=%(refname:short)", "refs/heads"]);
        let mut names: Vec<String> = out.lines().map(str::to_string).collect();
        names.sort();
        names
    }

    pub fn rev_parse(&self, rev: &str) -> String {
        self.git_output(&["rev-parse", rev])
    }

    /// Resolve `rev` in the bare remote.
    pub fn remote_rev_parse(&self, rev: &str) -> String {
        let output = Command::new("git")
            .args(["rev-parse", rev])
            .current_dir(self.remote_path())
            .output()
            .expect("git rev-parse failed");
        assert!(output.status.success(), "{} not found in remote", rev);
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    pub fn stash_count(&self) -> usize {
        self.git_output(&["stash", "list"]).lines().count()
    }

    /// Whether `ancestor` is reachable from `descendant`.
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        Command::new("git")
            .args(["merge-base", "--is-ancestor", ancestor, descendant])
            .current_dir(self.path())
            .status()
            .expect("git merge-base failed")
            .success()
    }

    pub fn git_cmd(&self, args: &[&str]) {
        run_git(self.path(), args);
    }

    pub fn git_output(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("git command failed");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    pub fn metadata_dir(&self, branch: &str) -> PathBuf {
        self.path().join(".git/cl/branches").join(branch)
    }
}

pub fn b(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

pub fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}
