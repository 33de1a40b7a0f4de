use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "htsim-ecn-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn ecn_plus_capture_finds_ect_syn_ack() {
    let dir = unique_temp_dir("ecn-plus-capture");
    let out_json = dir.join("capture.json");

    let output = Command::new(env!("CARGO_BIN_EXE_ecn_plus_capture"))
        .args(["--stop", "2s", "--capture-json", out_json.to_str().unwrap()])
        .env("RUST_LOG", "warn")
        .output()
        .expect("run ecn_plus_capture");
    assert!(
        output.status.success(),
        "ecn_plus_capture failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|l| l.starts_with("syn_ack "))
        .unwrap_or_else(|| panic!("no syn_ack line in stdout={stdout}"));
    assert!(line.contains("ip_ecn=Ect0"), "{line}");
    assert!(line.contains("ect=true"), "{line}");

    let raw = fs::read_to_string(&out_json).expect("read capture json");
    let v: Value = serde_json::from_str(&raw).expect("parse capture json");
    let arr = v.as_array().expect("capture json must be a JSON array");
    assert_eq!(arr[0].get("kind").and_then(|k| k.as_str()), Some("meta"));

    let syn_ack = arr
        .iter()
        .filter(|e| e.get("kind").and_then(|k| k.as_str()) == Some("tx_start"))
        .find(|e| {
            e.get("tcp")
                .and_then(|t| t.get("segment"))
                .and_then(|s| s.as_str())
                == Some("syn_ack")
        })
        .expect("syn_ack capture record");
    assert_eq!(syn_ack.get("ip_ecn").and_then(|e| e.as_str()), Some("ect0"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn classic_mode_syn_ack_is_not_ect() {
    let output = Command::new(env!("CARGO_BIN_EXE_ecn_plus_capture"))
        .args(["--ecn-mode", "ClassicEcn", "--stop", "2s"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("run ecn_plus_capture");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ip_ecn=NotEct"), "stdout={stdout}");
    assert!(stdout.contains("ect=false"), "stdout={stdout}");
}
