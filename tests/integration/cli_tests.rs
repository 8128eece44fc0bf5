//! Integration tests for the CLI binary.
//!
//! Runs the `idvault` binary against a temporary vault directory. A
//! `config.json` with cheap KDF parameters keeps each run fast.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `idvault` binary.
fn idvault() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_idvault"));
    cmd.env_remove("IDENTITY_VAULT_DIR");
    cmd
}

fn vault_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"kdf": {"m_cost": 1024, "t_cost": 1, "p_cost": 1}}"#,
    )
    .unwrap();
    dir
}

fn run(dir: &Path, passphrase: &str, args: &[&str]) -> Output {
    idvault()
        .arg("--dir")
        .arg(dir)
        .args(args)
        .env("IDENTITY_VAULT_PASSPHRASE", passphrase)
        .output()
        .expect("failed to execute idvault")
}

#[test]
fn cli_responds_to_help() {
    let output = idvault()
        .arg("--help")
        .output()
        .expect("failed to execute idvault --help");

    assert!(
        output.status.success(),
        "idvault --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage"),
        "idvault --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = idvault()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute idvault");
    assert!(!output.status.success());
}

#[test]
fn cli_init_creates_store() {
    let dir = vault_dir();
    let output = run(dir.path(), "pw", &["init"]);
    assert!(output.status.success());
    assert!(dir.path().join("identities.json").exists());
}

#[test]
fn cli_add_list_select() {
    let dir = vault_dir();

    let output = run(dir.path(), "pw", &["add-keypair", "--address", "0xcli"]);
    assert!(
        output.status.success(),
        "add-keypair failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let public_key = stdout
        .trim()
        .rsplit(' ')
        .next()
        .expect("public key printed")
        .to_string();
    assert_eq!(public_key.len(), 64);

    let output = run(dir.path(), "pw", &["list", "--json"]);
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["publicKey"], public_key.as_str());
    assert_eq!(listed[0]["privateKey"], "");

    let output = run(dir.path(), "pw", &["select", &public_key]);
    assert!(output.status.success());

    let output = run(dir.path(), "wrong", &["unlock-check"]);
    assert!(!output.status.success());
    let output = run(dir.path(), "pw", &["unlock-check"]);
    assert!(output.status.success());
}

#[test]
fn cli_select_unknown_fails() {
    let dir = vault_dir();
    let output = run(dir.path(), "pw", &["select", "nope"]);
    assert!(!output.status.success());
}

#[test]
fn cli_add_group_rejects_empty_path() {
    let dir = vault_dir();
    let path_file = dir.path().join("path.json");
    std::fs::write(&path_file, r#"{"path_elements": [], "path_index": [], "root": "r"}"#).unwrap();

    let output = run(
        dir.path(),
        "pw",
        &[
            "add-group",
            "--address",
            "0xg",
            "--provider",
            "github",
            "--name",
            "gold",
            "--commitment",
            "c1",
            "--serialized",
            "secret",
            "--path",
            path_file.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no path elements"), "stderr: {stderr}");
}
