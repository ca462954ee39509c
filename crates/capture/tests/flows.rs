//! Checks that the shipped flow files stay in sync with the built-in flow.

use std::path::{Path, PathBuf};

use pageshot_capture::{CaptureFlow, LoadWait, Step};

fn flows_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../flows")
}

#[test]
fn shipped_verify_design_flow_parses() {
    let flow = CaptureFlow::from_file(&flows_dir().join("verify-design.yaml")).unwrap();
    assert_eq!(flow.name, "verify-design");
    assert_eq!(flow.steps.len(), 5);
}

#[test]
fn shipped_flow_matches_builtin() {
    let shipped = CaptureFlow::from_file(&flows_dir().join("verify-design.yaml")).unwrap();
    let builtin = CaptureFlow::verify_design();

    let shipped_names: Vec<String> = shipped.steps.iter().map(|s| s.describe()).collect();
    let builtin_names: Vec<String> = builtin.steps.iter().map(|s| s.describe()).collect();
    assert_eq!(shipped_names, builtin_names);
}

#[test]
fn navigation_waits_for_network_idle() {
    let flow = CaptureFlow::from_file(&flows_dir().join("verify-design.yaml")).unwrap();
    match &flow.steps[0] {
        Step::Navigate { wait, .. } => assert_eq!(*wait, LoadWait::NetworkIdle),
        other => panic!("first step should navigate, got {other:?}"),
    }
}

#[test]
fn second_screenshot_comes_after_heading_wait() {
    let flow = CaptureFlow::from_file(&flows_dir().join("verify-design.yaml")).unwrap();

    let wait_idx = flow
        .steps
        .iter()
        .position(|s| s.describe().starts_with("wait:heading"))
        .expect("flow has a heading wait");
    let shot_idx = flow
        .steps
        .iter()
        .position(|s| s.describe() == "screenshot:assistant-page.png")
        .expect("flow has the assistant screenshot");

    assert!(wait_idx < shot_idx);
}

#[test]
fn load_all_picks_up_every_shipped_flow() {
    let flows = CaptureFlow::load_all(&flows_dir()).unwrap();
    assert!(flows.iter().any(|f| f.name == "verify-design"));
}
