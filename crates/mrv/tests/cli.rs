//! Exit codes of the `mrv-verify` binary for outcomes that need no live node.

use std::process::Command;

use mrv::store::RecordStore;
use mrv_testkit::{sample_record, TestFixture};

/// Nothing listens on the discard port in test environments.
const DEAD_RPC: &str = "http://127.0.0.1:9";

fn mrv_verify() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mrv-verify"));
    cmd.env_remove("BLOCKCHAIN_RPC_URL")
        .env_remove("CONTRACT_ADDRESS")
        .env_remove("PRIVATE_KEY")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn missing_arguments_exit_1() {
    let output = mrv_verify().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn help_exits_0() {
    let output = mrv_verify().arg("--help").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("mrv-verify"));
}

#[test]
fn unreadable_file_exits_1() {
    let fx = TestFixture::new();
    let output = mrv_verify()
        .args(["MRV-gone"])
        .arg(fx.scratch().join("MRV-gone.json"))
        .args(["--rpc-url", DEAD_RPC])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn unreachable_node_exits_4() {
    let fx = TestFixture::new();
    let store = fx.store();
    let record = sample_record("MRV-offline");
    store.save(&record, None).unwrap();

    let output = mrv_verify()
        .arg(record.id.as_str())
        .arg(store.path_for(&record.id))
        .args(["--rpc-url", DEAD_RPC])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("NOT CONNECTED"));
    assert!(stdout.contains(&record.digest().unwrap().to_hex()));
}
