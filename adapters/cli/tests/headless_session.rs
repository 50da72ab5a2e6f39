use std::{fs, path::PathBuf, process::Command};

fn level_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("levels/meadow.toml")
}

fn lane_defence() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lane-defence"))
}

#[test]
fn bundled_level_plays_a_wave_and_resumes_from_its_snapshot() {
    let snapshot = std::env::temp_dir().join(format!(
        "lane-defence-session-{}.lane",
        std::process::id()
    ));

    let output = lane_defence()
        .arg(level_path())
        .args(["--waves", "1", "--save"])
        .arg(&snapshot)
        .output()
        .expect("failed to run lane-defence");
    assert!(
        output.status.success(),
        "first session failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Welcome to Lane Defence."), "stdout: {stdout}");
    assert!(stdout.contains("after wave 1/10"), "stdout: {stdout}");

    let saved = fs::read_to_string(&snapshot).expect("snapshot written");
    assert!(saved.starts_with("lane:v1:"));

    let output = lane_defence()
        .arg(level_path())
        .args(["--waves", "1", "--load"])
        .arg(&snapshot)
        .output()
        .expect("failed to run lane-defence");
    let _ = fs::remove_file(&snapshot);
    assert!(
        output.status.success(),
        "resumed session failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("after wave 2/10"), "stdout: {stdout}");
}

#[test]
fn corrupt_snapshot_is_reported() {
    let snapshot = std::env::temp_dir().join(format!(
        "lane-defence-corrupt-{}.lane",
        std::process::id()
    ));
    fs::write(&snapshot, "fort:v1:e30").expect("write snapshot");

    let output = lane_defence()
        .arg(level_path())
        .arg("--load")
        .arg(&snapshot)
        .output()
        .expect("failed to run lane-defence");
    let _ = fs::remove_file(&snapshot);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not supported"), "stderr: {stderr}");
}
