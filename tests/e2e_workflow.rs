//! End-to-end workflow test
//!
//! Runs the binary against a mock landing page project:
//! 1. Apply patches
//! 2. Check the status report
//! 3. Re-apply and confirm nothing changes

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const TARGETS: [(&str, &str); 3] = [
    ("IconGrid.tsx", "src/modules/UIBlocks/Features/IconGrid.tsx"),
    (
        "ObjectionAccordion.tsx",
        "src/modules/UIBlocks/Objection/ObjectionAccordion.tsx",
    ),
    ("OutcomeIcons.tsx", "src/modules/UIBlocks/Results/OutcomeIcons.tsx"),
];

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

/// Create a mock Next.js project containing the three UI blocks
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), r#"{ "name": "landing" }"#).unwrap();

    for (fixture_name, relative) in TARGETS {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, fixture(&format!("{fixture_name}.input"))).unwrap();
    }

    dir
}

fn patcher(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_icon-debug-patcher"))
        .args(args)
        .arg("--root")
        .arg(root)
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env_remove("ICON_DEBUG_PATCHER_ROOT")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_apply_then_reapply() {
    let project = setup_project();

    let first = patcher(project.path(), &["apply", "--strict"]);
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(first.status.success(), "apply failed:\n{stdout}");
    assert!(stdout.contains("icon-grid: Patched"));
    assert!(stdout.contains("objection-accordion: Patched"));
    assert!(stdout.contains("outcome-icons: Patched"));

    for (fixture_name, relative) in TARGETS {
        let patched = fs::read_to_string(project.path().join(relative)).unwrap();
        assert_eq!(patched, fixture(&format!("{fixture_name}.expected")));
    }

    let second = patcher(project.path(), &["apply", "--strict"]);
    let stdout = String::from_utf8_lossy(&second.stdout);
    assert!(second.status.success(), "re-apply failed:\n{stdout}");
    assert_eq!(stdout.matches(": Already applied to ").count(), 3);

    for (fixture_name, relative) in TARGETS {
        let patched = fs::read_to_string(project.path().join(relative)).unwrap();
        assert_eq!(patched, fixture(&format!("{fixture_name}.expected")));
    }
}

#[test]
fn test_status_before_and_after() {
    let project = setup_project();

    let before = patcher(project.path(), &["status"]);
    assert!(before.status.success());
    let stdout = String::from_utf8_lossy(&before.stdout);
    assert_eq!(stdout.matches(": not applied").count(), 6);

    // status never writes
    let (fixture_name, relative) = TARGETS[0];
    assert_eq!(
        fs::read_to_string(project.path().join(relative)).unwrap(),
        fixture(&format!("{fixture_name}.input"))
    );

    assert!(patcher(project.path(), &["apply"]).status.success());

    let after = patcher(project.path(), &["status"]);
    let stdout = String::from_utf8_lossy(&after.stdout);
    assert_eq!(stdout.matches(": already applied").count(), 6);
}

#[test]
fn test_dry_run_with_diff() {
    let project = setup_project();

    let output = patcher(project.path(), &["apply", "--dry-run", "--diff"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("icon-grid: Would patch"));
    assert!(stdout.contains("+    console.log('🎯 [IconGrid] Saved icon fields:', icons);"));

    for (fixture_name, relative) in TARGETS {
        let content = fs::read_to_string(project.path().join(relative)).unwrap();
        assert_eq!(content, fixture(&format!("{fixture_name}.input")));
    }
}
