use anyhow::Result;
use securedrop_config_migrate::core::lock::MigrationLock;
use securedrop_config_migrate::LockMode;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SPLIT_BIN: &str = env!("CARGO_BIN_EXE_securedrop-config-migrate");
const LEGACY_BIN: &str = env!("CARGO_BIN_EXE_securedrop-config-migrate-legacy");

fn run(bin: &str, temp_dir: &TempDir, args: &[&str]) -> Result<Output> {
    let output = Command::new(bin)
        .args(args)
        .env("SECUREDROP_CONFIG_DIR", temp_dir.path())
        .env("SECUREDROP_MIGRATE_LOCK", temp_dir.path().join("migrate.lock"))
        .env("SECUREDROP_LEGACY_CONFIG", temp_dir.path().join("config.py"))
        .env_remove("RUST_LOG")
        .output()?;
    Ok(output)
}

fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}

#[test]
fn test_split_binary_migrates_and_skips() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("config.py"), "SCRYPT_ID_PEPPER = 'abc'\n")?;

    let first = run(SPLIT_BIN, &temp_dir, &[])?;
    assert_eq!(first.status.code(), Some(0));
    assert_eq!(
        read_json(&temp_dir.path().join("source-config.json"))?,
        json!({"scrypt_id_pepper": "abc"})
    );
    let before = fs::read(temp_dir.path().join("journalist-config.json"))?;

    fs::write(temp_dir.path().join("config.py"), "SCRYPT_ID_PEPPER = 'xyz'\n")?;
    let second = run(SPLIT_BIN, &temp_dir, &[])?;
    assert_eq!(second.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&second.stdout).contains("already exists"));
    assert_eq!(fs::read(temp_dir.path().join("journalist-config.json"))?, before);

    let forced = run(SPLIT_BIN, &temp_dir, &["--force"])?;
    assert_eq!(forced.status.code(), Some(0));
    assert_eq!(
        read_json(&temp_dir.path().join("journalist-config.json"))?,
        json!({"scrypt_id_pepper": "xyz"})
    );
    Ok(())
}

#[test]
fn test_split_binary_fails_when_locked() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let _held = MigrationLock::acquire(&temp_dir.path().join("migrate.lock"), LockMode::NonBlocking)?;

    let output = run(SPLIT_BIN, &temp_dir, &["--force"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to acquire lock."));
    assert!(!temp_dir.path().join("source-config.json").exists());
    assert!(!temp_dir.path().join("journalist-config.json").exists());
    Ok(())
}

#[test]
fn test_split_binary_missing_legacy_config() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let output = run(SPLIT_BIN, &temp_dir, &[])?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read_to_string(temp_dir.path().join("source-config.json"))?, "{}");
    assert_eq!(fs::read_to_string(temp_dir.path().join("journalist-config.json"))?, "{}");
    Ok(())
}

#[test]
fn test_legacy_binary_writes_combined_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(
        temp_dir.path().join("config.py"),
        "class SourceInterfaceFlaskConfig:\n    SECRET_KEY = 's'\n",
    )?;

    let output = run(LEGACY_BIN, &temp_dir, &[])?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        read_json(&temp_dir.path().join("config.json"))?,
        json!({"source_interface": {"secret_key": "s"}, "journalist_interface": {}})
    );

    let before = fs::read(temp_dir.path().join("config.json"))?;
    fs::write(temp_dir.path().join("config.py"), "SCRYPT_ID_PEPPER = 'later'\n")?;

    let again = run(LEGACY_BIN, &temp_dir, &[])?;
    assert_eq!(again.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&again.stdout).contains("already exists"));
    assert_eq!(fs::read(temp_dir.path().join("config.json"))?, before);
    Ok(())
}

#[test]
fn test_unwritable_config_dir_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("not-a-dir"), "")?;

    let output = Command::new(SPLIT_BIN)
        .env("SECUREDROP_CONFIG_DIR", temp_dir.path().join("not-a-dir"))
        .env("SECUREDROP_MIGRATE_LOCK", temp_dir.path().join("migrate.lock"))
        .env("SECUREDROP_LEGACY_CONFIG", temp_dir.path().join("config.py"))
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    Ok(())
}

#[test]
fn test_split_binary_rejects_broken_legacy_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("config.py"), "SCRYPT_ID_PEPPER = 'abc\n")?;

    let output = run(SPLIT_BIN, &temp_dir, &[])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not be imported"));
    assert!(output.stdout.is_empty());
    assert!(!temp_dir.path().join("source-config.json").exists());
    assert!(!temp_dir.path().join("journalist-config.json").exists());
    Ok(())
}
