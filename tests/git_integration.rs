//! Integration tests for the Git interface.
//!
//! These tests use real git repositories created via tempfile, each with a
//! bare repository standing in for `origin`.

mod common;

use branchtale::core::types::BranchName;
use branchtale::git::{Git, GitError};

use common::{TestRepo, ORIGIN_URL};

fn name(s: &str) -> BranchName {
    BranchName::new(s).unwrap()
}

mod opening {
    use super::*;

    #[test]
    fn discovers_from_subdirectory() {
        let repo = TestRepo::new();
        let sub = repo.path().join("nested/dir");
        std::fs::create_dir_all(&sub).unwrap();
        assert!(Git::open(&sub).is_ok());
    }

    #[test]
    fn outside_a_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Git::open(dir.path()).unwrap_err();
        assert!(matches!(err, GitError::NotARepo { .. }));
    }

    #[test]
    fn bare_repository_rejected() {
        let repo = TestRepo::new();
        let err = Git::open(&repo.origin_path()).unwrap_err();
        assert!(matches!(err, GitError::BareRepo));
    }
}

mod repo_info {
    use super::*;

    #[test]
    fn on_main() {
        let repo = TestRepo::new();
        let info = repo.git().repo_info().unwrap();
        assert_eq!(info.current_branch.as_str(), "main");
        assert_eq!(info.main_branch.as_str(), "main");
        assert!(info.is_on_main);
    }

    #[test]
    fn on_feature_branch() {
        let repo = TestRepo::new();
        repo.checkout_new("fix/timeout");
        let info = repo.git().repo_info().unwrap();
        assert_eq!(info.current_branch.as_str(), "fix/timeout");
        assert_eq!(info.main_branch.as_str(), "main");
        assert!(!info.is_on_main);
    }

    #[test]
    fn master_trunk() {
        let repo = TestRepo::with_trunk("master");
        let info = repo.git().repo_info().unwrap();
        assert_eq!(info.main_branch.as_str(), "master");
        assert!(info.is_on_main);
    }

    #[test]
    fn main_wins_when_both_exist() {
        let repo = TestRepo::with_trunk("master");
        repo.branch("main");
        let info = repo.git().repo_info().unwrap();
        assert_eq!(info.main_branch.as_str(), "main");
        assert!(!info.is_on_main);
    }

    #[test]
    fn neither_defaults_to_master() {
        let repo = TestRepo::with_trunk("develop");
        let info = repo.git().repo_info().unwrap();
        assert_eq!(info.main_branch.as_str(), "master");
        assert!(!info.is_on_main);
    }

    #[test]
    fn detached_head() {
        let repo = TestRepo::new();
        repo.detach();
        let err = repo.git().repo_info().unwrap_err();
        assert!(matches!(err, GitError::DetachedHead));
    }

    #[test]
    fn empty_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        common::run_git(dir.path(), &["init", "-q", "-b", "main"]);
        let err = Git::open(dir.path()).unwrap().repo_info().unwrap_err();
        assert!(matches!(err, GitError::HeadUnresolved { .. }));
    }

    #[test]
    fn branches_sorted() {
        let repo = TestRepo::new();
        repo.branch("zeta");
        repo.branch("alpha");
        let names: Vec<String> = repo
            .git()
            .list_branches()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, vec!["alpha", "main", "zeta"]);
    }
}

mod diff_between {
    use super::*;

    #[test]
    fn linear_history_newest_first() {
        let repo = TestRepo::new();
        let c1 = repo.commit_file("a.txt", "a\n", "c1");
        let c2 = repo.commit_file("b.txt", "b\n", "c2");
        let c3 = repo.commit_file("c.txt", "c\n", "c3");

        let range = repo
            .git()
            .diff_between("origin", &name("main"), &name("main"))
            .unwrap();

        let oids: Vec<&str> = range.commits.iter().map(|c| c.oid.as_str()).collect();
        assert_eq!(oids, vec![c3.as_str(), c2.as_str(), c1.as_str()]);
        assert_eq!(range.commits[0].summary, "c3");
        assert_eq!(range.commits[0].author_name, "Test User");
        assert_eq!(range.commits[0].author_email, "test@example.com");
    }

    #[test]
    fn patch_goes_from_remote_to_local() {
        let repo = TestRepo::new();
        repo.commit_file("added.txt", "new line\n", "add file");
        repo.remove_file("README.md", "drop readme");

        let range = repo
            .git()
            .diff_between("origin", &name("main"), &name("main"))
            .unwrap();

        assert!(range.diff.contains("+new line"));
        assert!(range.diff.contains("-# Widgets"));
        assert!(range.diff.contains("added.txt"));
    }

    #[test]
    fn identical_refs_are_empty() {
        let repo = TestRepo::new();
        let range = repo
            .git()
            .diff_between("origin", &name("main"), &name("main"))
            .unwrap();
        assert!(range.is_empty());
        assert!(range.commits.is_empty());
        assert_eq!(range.diff, "");
    }

    #[test]
    fn identical_trees_are_empty() {
        let repo = TestRepo::new();
        repo.commit_file("tmp.txt", "x\n", "add tmp");
        repo.remove_file("tmp.txt", "remove tmp");

        let range = repo
            .git()
            .diff_between("origin", &name("main"), &name("main"))
            .unwrap();
        assert!(range.commits.is_empty());
        assert_eq!(range.diff, "");
    }

    #[test]
    fn feature_branch_against_remote_trunk() {
        let repo = TestRepo::new();
        repo.checkout_new("fix/timeout");
        let c1 = repo.commit_file("timeout.rs", "fn t() {}\n", "Raise timeout");

        let range = repo
            .git()
            .diff_between("origin", &name("main"), &name("fix/timeout"))
            .unwrap();
        assert_eq!(range.commits.len(), 1);
        assert_eq!(range.commits[0].oid.as_str(), c1);
    }

    #[test]
    fn missing_remote_ref() {
        let repo = TestRepo::new();
        let err = repo
            .git()
            .diff_between("origin", &name("nope"), &name("main"))
            .unwrap_err();
        match err {
            GitError::RefNotFound { refname } => {
                assert_eq!(refname, "refs/remotes/origin/nope")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_local_ref() {
        let repo = TestRepo::new();
        let err = repo
            .git()
            .diff_between("origin", &name("main"), &name("ghost"))
            .unwrap_err();
        assert!(
            matches!(err, GitError::RefNotFound { ref refname } if refname == "refs/heads/ghost")
        );
    }

    #[test]
    fn diverged_history_is_not_reachable() {
        let repo = TestRepo::new();
        repo.commit_file("shared.txt", "one\n", "pushed");
        repo.push("main");
        repo.reset_hard("HEAD~1");
        repo.commit_file("other.txt", "two\n", "rewritten");

        let err = repo
            .git()
            .diff_between("origin", &name("main"), &name("main"))
            .unwrap_err();
        assert!(matches!(err, GitError::BaseNotReachable { .. }));
    }
}

mod fork_point {
    use super::*;

    #[test]
    fn merge_base_is_where_branch_forked() {
        let repo = TestRepo::new();
        let fork = repo.rev_parse("HEAD");
        repo.checkout_new("fix/timeout");
        repo.commit_file("t.txt", "t\n", "Feature work");
        repo.checkout("main");
        repo.commit_file("u.txt", "u\n", "Upstream change");
        repo.push("main");

        let base = repo
            .git()
            .merge_base("origin", &name("main"), &name("fix/timeout"))
            .unwrap();
        assert_eq!(base.as_str(), fork);
    }

    #[test]
    fn diff_from_fork_ignores_trunk_progress() {
        let repo = TestRepo::new();
        repo.checkout_new("fix/timeout");
        let work = repo.commit_file("t.txt", "t\n", "Feature work");
        repo.checkout("main");
        repo.commit_file("u.txt", "u\n", "Upstream change");
        repo.push("main");

        let git = repo.git();
        assert!(matches!(
            git.diff_between("origin", &name("main"), &name("fix/timeout")),
            Err(GitError::BaseNotReachable { .. })
        ));

        let base = git
            .merge_base("origin", &name("main"), &name("fix/timeout"))
            .unwrap();
        let range = git.diff_from(&base, &name("fix/timeout")).unwrap();
        let oids: Vec<&str> = range.commits.iter().map(|c| c.oid.as_str()).collect();
        assert_eq!(oids, vec![work.as_str()]);
        assert!(range.diff.contains("t.txt"));
        assert!(!range.diff.contains("u.txt"));
    }

    #[test]
    fn unrelated_histories() {
        let repo = TestRepo::new();
        common::run_git(&repo.path(), &["checkout", "-q", "--orphan", "island"]);
        repo.commit_file("island.txt", "i\n", "Island root");

        let err = repo
            .git()
            .merge_base("origin", &name("main"), &name("island"))
            .unwrap_err();
        assert!(matches!(err, GitError::BaseNotReachable { .. }));
    }

    #[test]
    fn merged_trunk_keeps_earlier_branch_commits() {
        let repo = TestRepo::new();
        repo.checkout_new("fix/timeout");
        let work = repo.commit_file("t.txt", "t\n", "Feature work");
        repo.checkout("main");
        let upstream = repo.commit_file("u.txt", "u\n", "Upstream change");
        repo.push("main");
        repo.checkout("fix/timeout");
        repo.merge("main");
        let merge = repo.rev_parse("HEAD");

        let range = repo
            .git()
            .diff_between("origin", &name("main"), &name("fix/timeout"))
            .unwrap();
        let oids: Vec<&str> = range.commits.iter().map(|c| c.oid.as_str()).collect();
        assert_eq!(oids, vec![merge.as_str(), work.as_str()]);
        assert!(!oids.contains(&upstream.as_str()));
    }
}

mod remote {
    use super::*;

    #[test]
    fn url_is_configured_value() {
        let repo = TestRepo::new();
        assert_eq!(repo.git().remote_url("origin").unwrap(), ORIGIN_URL);
    }

    #[test]
    fn unknown_remote_url() {
        let repo = TestRepo::new();
        let err = repo.git().remote_url("upstream").unwrap_err();
        assert!(matches!(err, GitError::RemoteNotFound { ref remote } if remote == "upstream"));
    }

    #[test]
    fn exact_branch_match_only() {
        let repo = TestRepo::new();
        repo.checkout_new("feature/xy");
        repo.push("feature/xy");

        let git = repo.git();
        assert!(git
            .branch_exists_on_remote(&name("feature/xy"), "origin")
            .unwrap());
        assert!(!git
            .branch_exists_on_remote(&name("feature/x"), "origin")
            .unwrap());
        assert!(git.branch_exists_on_remote(&name("main"), "origin").unwrap());
    }

    #[test]
    fn unreachable_remote_is_an_error() {
        let repo = TestRepo::new();
        let err = repo
            .git()
            .branch_exists_on_remote(&name("main"), "nowhere")
            .unwrap_err();
        assert!(matches!(
            err,
            GitError::RemoteAuth { .. } | GitError::RemoteNetwork { .. } | GitError::RemoteCommand { .. }
        ));
    }
}

mod mutation {
    use super::*;

    #[test]
    fn create_does_not_checkout() {
        let repo = TestRepo::new();
        let head = repo.rev_parse("HEAD");
        repo.git().create_branch(&name("feat/new")).unwrap();

        assert!(repo.has_local_branch("feat/new"));
        assert_eq!(repo.rev_parse("feat/new"), head);
        assert_eq!(repo.current_branch(), "main");
    }

    #[test]
    fn create_existing_fails() {
        let repo = TestRepo::new();
        repo.branch("taken");
        let err = repo.git().create_branch(&name("taken")).unwrap_err();
        assert!(
            matches!(err, GitError::RefAlreadyExists { ref refname } if refname == "refs/heads/taken")
        );
    }

    #[test]
    fn checkout_switches_head() {
        let repo = TestRepo::new();
        let git = repo.git();
        git.create_branch(&name("feat/new")).unwrap();
        git.checkout_branch(&name("feat/new")).unwrap();
        assert_eq!(repo.current_branch(), "feat/new");
    }

    #[test]
    fn checkout_missing_branch() {
        let repo = TestRepo::new();
        let err = repo.git().checkout_branch(&name("ghost")).unwrap_err();
        assert!(matches!(err, GitError::BranchNotFound { ref branch } if branch == "ghost"));
    }

    #[test]
    fn push_creates_remote_branch() {
        let repo = TestRepo::new();
        repo.checkout_new("fix/timeout");
        let tip = repo.commit_file("t.txt", "t\n", "timeout");

        repo.git().push_branch(&name("fix/timeout"), "origin").unwrap();
        assert_eq!(repo.origin_head("fix/timeout"), Some(tip));
    }

    #[test]
    fn rejected_push_is_non_fast_forward() {
        let repo = TestRepo::new();
        repo.checkout_new("fix/timeout");
        repo.commit_file("t.txt", "one\n", "first");
        repo.push("fix/timeout");
        repo.reset_hard("HEAD~1");
        repo.commit_file("t.txt", "two\n", "rewritten");

        let err = repo
            .git()
            .push_branch(&name("fix/timeout"), "origin")
            .unwrap_err();
        assert!(matches!(err, GitError::NonFastForward { ref branch, .. } if branch == "fix/timeout"));
    }
}
