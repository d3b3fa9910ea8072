// tests/maintenance_workflow.rs

//! Lock, prune, outdated, uninstall, and generate flows against real
//! git repositories.

mod common;

use std::fs;

use bale::ops::{self, InstallOptions, OutdatedOptions, OutdatedStatus, RemoveOptions};
use bale::SilentProgress;

use common::{install_opts, head_of, Project};

#[test]
fn test_lock_then_locked_install_reproduces() {
    if !common::git_available() {
        eprintln!("Skipping: git not found on PATH");
        return;
    }
    let project = Project::new();
    let pinned_rev = project.add_remote("github.com/acme/widget");
    project.write_manifest("# Balefile v1\nacme/widget\n");
    ops::install(
        project.root(),
        &project.vcs(),
        &install_opts(&[]),
        &SilentProgress::new(),
    )
    .unwrap();

    let lock = ops::lock(project.root(), &project.vcs()).unwrap();
    assert_eq!(lock.get("github.com/acme/widget"), Some(pinned_rev.as_str()));
    assert!(project.lock_path().exists());

    // Upstream moves on; a locked install on a clean machine still
    // reproduces the recorded revision.
    project.advance_remote("github.com/acme/widget");
    fs::remove_dir_all(project.root().join(".vendor")).unwrap();

    let locked = InstallOptions {
        respect_locked: true,
        ..install_opts(&[])
    };
    let report =
        ops::install(project.root(), &project.vcs(), &locked, &SilentProgress::new()).unwrap();
    assert!(report.is_success());
    assert_eq!(
        head_of(&project.checkout_dir("github.com/acme/widget")),
        pinned_rev
    );
}

#[test]
fn test_lock_requires_installed_packages() {
    if !common::git_available() {
        eprintln!("Skipping: git not found on PATH");
        return;
    }
    let project = Project::new();
    project.add_remote("github.com/acme/widget");
    project.write_manifest("# Balefile v1\nacme/widget\n");

    let err = ops::lock(project.root(), &project.vcs()).unwrap_err();
    assert!(err.to_string().contains("github.com/acme/widget"));
    assert!(!project.lock_path().exists());
}

#[test]
fn test_uninstall_removes_checkout_and_manifest_entry() {
    if !common::git_available() {
        eprintln!("Skipping: git not found on PATH");
        return;
    }
    let project = Project::new();
    project.add_remote("github.com/acme/widget");
    project.add_remote("github.com/acme/gadget");

    let opts = InstallOptions {
        save: true,
        ..install_opts(&["acme/widget", "acme/gadget"])
    };
    ops::install(project.root(), &project.vcs(), &opts, &SilentProgress::new()).unwrap();

    let remove = RemoveOptions {
        packages: vec!["acme/widget".to_string()],
        save: true,
        global: false,
    };
    let report = ops::remove(project.root(), &remove, &SilentProgress::new()).unwrap();

    assert!(report.is_success());
    assert!(!project.checkout_dir("github.com/acme/widget").exists());
    assert!(project.checkout_dir("github.com/acme/gadget").exists());

    let manifest = project.read_manifest();
    assert!(!manifest.contains("github.com/acme/widget"));
    assert!(manifest.contains("github.com/acme/gadget"));
}

#[test]
fn test_prune_removes_unlisted_checkouts() {
    if !common::git_available() {
        eprintln!("Skipping: git not found on PATH");
        return;
    }
    let project = Project::new();
    project.add_remote("github.com/acme/widget");
    project.add_remote("github.com/acme/stray");
    ops::install(
        project.root(),
        &project.vcs(),
        &install_opts(&["acme/widget", "acme/stray"]),
        &SilentProgress::new(),
    )
    .unwrap();

    // Only widget is listed; stray must go.
    project.write_manifest("# Balefile v1\nacme/widget\n");
    let report = ops::prune(project.root(), false, &SilentProgress::new()).unwrap();

    assert!(report.is_success());
    assert_eq!(report.len(), 1);
    assert!(project.checkout_dir("github.com/acme/widget").exists());
    assert!(!project.checkout_dir("github.com/acme/stray").exists());
}

#[test]
fn test_outdated_reports_drift() {
    if !common::git_available() {
        eprintln!("Skipping: git not found on PATH");
        return;
    }
    let project = Project::new();
    let old_rev = project.add_remote("github.com/acme/widget");
    project.add_remote("github.com/acme/gadget");
    project.write_manifest("# Balefile v1\nacme/widget\nacme/gadget\n");
    ops::install(
        project.root(),
        &project.vcs(),
        &install_opts(&[]),
        &SilentProgress::new(),
    )
    .unwrap();

    let new_rev = project.advance_remote("github.com/acme/widget");

    let entries = ops::outdated(
        project.root(),
        &project.vcs(),
        &OutdatedOptions::default(),
        &SilentProgress::new(),
    )
    .unwrap();

    assert_eq!(entries.len(), 2);
    let widget = entries
        .iter()
        .find(|e| e.import_path == "github.com/acme/widget")
        .unwrap();
    match &widget.status {
        OutdatedStatus::Outdated { local, upstream } => {
            assert_eq!(local.as_deref(), Some(old_rev.as_str()));
            assert_eq!(upstream, &new_rev);
        }
        other => panic!("unexpected status: {other:?}"),
    }
    let gadget = entries
        .iter()
        .find(|e| e.import_path == "github.com/acme/gadget")
        .unwrap();
    assert!(gadget.is_current());

    // Checking never touches the checkout.
    assert_eq!(head_of(&project.checkout_dir("github.com/acme/widget")), old_rev);
}

#[test]
fn test_generate_seeds_manifest_from_tree() {
    if !common::git_available() {
        eprintln!("Skipping: git not found on PATH");
        return;
    }
    let project = Project::new();
    project.add_remote("github.com/acme/widget");
    project.add_remote("github.com/acme/gadget");
    ops::install(
        project.root(),
        &project.vcs(),
        &install_opts(&["acme/widget", "acme/gadget"]),
        &SilentProgress::new(),
    )
    .unwrap();
    assert!(!project.manifest_path().exists());

    let manifest = ops::generate(project.root()).unwrap();
    assert_eq!(manifest.packages().count(), 2);

    let written = project.read_manifest();
    assert!(written.starts_with("# Balefile v1"));
    assert!(written.contains("github.com/acme/widget"));
    assert!(written.contains("github.com/acme/gadget"));

    // A second generate refuses to clobber the file.
    let err = ops::generate(project.root()).unwrap_err();
    assert!(err.to_string().contains("Refusing to overwrite"));
}

#[test]
fn test_lock_reconciles_removed_entries() {
    if !common::git_available() {
        eprintln!("Skipping: git not found on PATH");
        return;
    }
    let project = Project::new();
    project.add_remote("github.com/acme/widget");
    project.add_remote("github.com/acme/gadget");
    project.write_manifest("# Balefile v1\nacme/widget\nacme/gadget\n");
    ops::install(
        project.root(),
        &project.vcs(),
        &install_opts(&[]),
        &SilentProgress::new(),
    )
    .unwrap();
    ops::lock(project.root(), &project.vcs()).unwrap();

    // Drop gadget from the manifest; the next lock drops its pin.
    project.write_manifest("# Balefile v1\nacme/widget\n");
    let lock = ops::lock(project.root(), &project.vcs()).unwrap();

    assert_eq!(lock.len(), 1);
    assert!(lock.get("github.com/acme/gadget").is_none());
    let on_disk = fs::read_to_string(project.lock_path()).unwrap();
    assert!(!on_disk.contains("gadget"));
}
