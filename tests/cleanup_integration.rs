//! Integration tests for `new` and `cleanup`.

mod common;

use common::{b, TestRepo};

use clchain::engine::chain::resolve_chain;
use clchain::engine::cleanup::{cleanup, CleanupOptions};
use clchain::engine::new::new_branch;
use clchain::engine::ClError;

/// master -> feature1 -> feature2, on feature2.
fn chain_repo() -> TestRepo {
    let repo = TestRepo::new();
    let session = repo.session();
    new_branch(&session, &b("feature1")).unwrap();
    repo.commit("one.txt", "one\n", "Add one");
    new_branch(&session, &b("feature2")).unwrap();
    repo.commit("two.txt", "two\n", "Add two");
    repo
}

/// Land feature1's content on the remote master, as a submit would.
fn land_feature1(repo: &TestRepo) {
    let current = repo.current_branch();
    repo.checkout("master");
    repo.git_cmd(&["merge", "-q", "--squash", "feature1"]);
    repo.git_cmd(&["commit", "-q", "-m", "Add one (submitted)"]);
    repo.git_cmd(&["push", "-q", "origin", "master"]);
    repo.git_cmd(&["reset", "-q", "--hard", "HEAD~1"]);
    repo.checkout(&current);
}

// =============================================================================
// new
// =============================================================================

#[test]
fn new_records_the_parent_chain() {
    let repo = chain_repo();
    let session = repo.session();

    assert_eq!(
        resolve_chain(&session.store, session.upstream(), &b("feature1")).unwrap(),
        vec![b("master")]
    );
    assert_eq!(
        resolve_chain(&session.store, session.upstream(), &b("feature2")).unwrap(),
        vec![b("master"), b("feature1")]
    );
    assert_eq!(repo.current_branch(), "feature2");
    assert_eq!(repo.rev_parse("feature2~1"), repo.rev_parse("feature1"));
}

#[test]
fn new_refuses_existing_branch() {
    let repo = chain_repo();
    repo.checkout("feature1");

    let err = new_branch(&repo.session(), &b("feature2")).unwrap_err();

    assert!(matches!(err, ClError::BranchExists { .. }));
    assert_eq!(repo.current_branch(), "feature1");
    let session = repo.session();
    assert_eq!(
        resolve_chain(&session.store, session.upstream(), &b("feature2")).unwrap(),
        vec![b("master"), b("feature1")]
    );
}

#[test]
fn new_refuses_detached_head() {
    let repo = TestRepo::new();
    repo.git_cmd(&["checkout", "-q", "--detach"]);

    let err = new_branch(&repo.session(), &b("feature1")).unwrap_err();

    assert!(matches!(err, ClError::DetachedHead));
    assert!(!repo.branch_exists("feature1"));
}

// =============================================================================
// cleanup
// =============================================================================

#[test]
fn cleanup_deletes_landed_branch_and_rewrites_dependents() {
    let repo = chain_repo();
    land_feature1(&repo);
    repo.git_cmd(&["branch", "feature1-REVIEW", "feature1"]);
    let session = repo.session();
    session
        .store
        .write_commit_message(&b("feature1"), "Add one\n")
        .unwrap();

    let report = cleanup(&session, &[b("feature1")], &CleanupOptions::default()).unwrap();

    assert_eq!(report.deleted, vec![b("feature1")]);
    assert_eq!(report.rewritten, vec![b("feature2")]);
    assert!(!repo.branch_exists("feature1"));
    assert!(!repo.branch_exists("feature1-REVIEW"));
    assert!(!repo.metadata_dir("feature1").exists());
    assert_eq!(
        resolve_chain(&session.store, session.upstream(), &b("feature2")).unwrap(),
        vec![b("master")]
    );
    assert_eq!(repo.current_branch(), "feature2");
    // The upstream was pulled.
    assert_eq!(repo.rev_parse("master"), repo.rev_parse("origin/master"));
}

#[test]
fn cleanup_refuses_unmerged_branch() {
    let repo = chain_repo();
    repo.write("two.txt", "dirty\n");

    let err = cleanup(
        &repo.session(),
        &[b("feature1")],
        &CleanupOptions::default(),
    )
    .unwrap_err();

    match &err {
        ClError::UnmergedChanges { branch, files } => {
            assert_eq!(branch, &b("feature1"));
            assert_eq!(files, &vec!["one.txt".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_conflict());
    assert!(repo.branch_exists("feature1"));
    assert_eq!(repo.current_branch(), "feature2");
    assert_eq!(repo.read("two.txt"), "dirty\n");
    assert_eq!(repo.stash_count(), 0);
}

#[test]
fn forced_cleanup_skips_merge_check() {
    let repo = chain_repo();
    repo.checkout("feature1");

    let report = cleanup(
        &repo.session(),
        &[b("feature2")],
        &CleanupOptions {
            force: true,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(report.deleted, vec![b("feature2")]);
    assert!(report.rewritten.is_empty());
    assert!(!repo.branch_exists("feature2"));
    assert!(!repo.metadata_dir("feature2").exists());
    assert_eq!(repo.current_branch(), "feature1");
}

#[test]
fn cleanup_of_current_branch_stays_on_upstream() {
    let repo = chain_repo();
    land_feature1(&repo);
    repo.checkout("feature1");

    cleanup(&repo.session(), &[b("feature1")], &CleanupOptions::default()).unwrap();

    assert_eq!(repo.current_branch(), "master");
    assert!(!repo.branch_exists("feature1"));
}

#[test]
fn cleanup_against_another_remote_branch() {
    let repo = chain_repo();
    // feature1 landed on a release branch rather than master.
    repo.git_cmd(&["push", "-q", "origin", "feature1:release"]);
    repo.git_cmd(&["fetch", "-q", "origin"]);

    cleanup(
        &repo.session(),
        &[b("feature1")],
        &CleanupOptions {
            force: false,
            remote_branch: Some(b("release")),
        },
    )
    .unwrap();

    assert!(!repo.branch_exists("feature1"));
}

#[test]
fn cleanup_refuses_upstream_and_unknown_branches() {
    let repo = chain_repo();
    let session = repo.session();

    let err = cleanup(&session, &[b("master")], &CleanupOptions::default()).unwrap_err();
    assert!(matches!(err, ClError::ProtectedBranch { .. }));

    let err = cleanup(
        &session,
        &[b("feature1"), b("missing")],
        &CleanupOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ClError::BranchNotFound { .. }));

    // Validation happens before anything is deleted.
    assert!(repo.branch_exists("feature1"));
    assert_eq!(repo.current_branch(), "feature2");
}
