use assert_cmd::Command;
use predicates::prelude::*;

const PRG: &str = "genbank-grabber";

#[test]
fn dies_no_args() {
    Command::cargo_bin(PRG)
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_options() {
    Command::cargo_bin(PRG)
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--out"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn invalid_accession_exits_with_two() {
    Command::cargo_bin(PRG)
        .unwrap()
        .arg("not an accession")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid accession"));
}

#[test]
fn unsupported_rettype_fails_before_network() {
    let temp = tempfile::tempdir().unwrap();
    Command::cargo_bin(PRG)
        .unwrap()
        .current_dir(temp.path())
        .env_remove("NCBI_API_KEY")
        .args(["NC_045512.2", "--rettype", "gb", "--config"])
        .arg(write_config(&temp))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsupported return type"));
}

fn write_config(temp: &tempfile::TempDir) -> std::path::PathBuf {
    let path = temp.path().join("grabber.json");
    std::fs::write(&path, r#"{ "base_url": "http://127.0.0.1:9" }"#).unwrap();
    path
}

fn write_local_config(temp: &tempfile::TempDir, body: &str) {
    std::fs::write(temp.path().join("genbank-grabber.json"), body).unwrap();
}

#[test]
fn local_config_is_discovered_and_remote_failure_exits_with_three() {
    let temp = tempfile::tempdir().unwrap();
    write_local_config(&temp, r#"{ "base_url": "http://127.0.0.1:9", "timeout_secs": 5 }"#);
    Command::cargo_bin(PRG)
        .unwrap()
        .current_dir(temp.path())
        .env_remove("NCBI_API_KEY")
        .args(["NC_045512.2", "-o", "x.fa"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E-utilities request failed"));
    assert!(temp.path().join("fasta").is_dir());
    assert!(!temp.path().join("fasta").join("x.fa").exists());
}

#[test]
fn outdir_flag_replaces_default_directory() {
    let temp = tempfile::tempdir().unwrap();
    write_local_config(&temp, r#"{ "base_url": "http://127.0.0.1:9", "timeout_secs": 5 }"#);
    Command::cargo_bin(PRG)
        .unwrap()
        .current_dir(temp.path())
        .env_remove("NCBI_API_KEY")
        .args(["NC_045512.2", "-d", "out", "-o", "x.fa"])
        .assert()
        .code(3);
    assert!(temp.path().join("out").is_dir());
    assert!(!temp.path().join("fasta").exists());
}

#[test]
fn discovered_config_with_zero_timeout_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    write_local_config(&temp, r#"{ "timeout_secs": 0 }"#);
    Command::cargo_bin(PRG)
        .unwrap()
        .current_dir(temp.path())
        .arg("NC_045512.2")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timeout_secs must be greater than zero"));
    assert!(!temp.path().join("fasta").exists());
}
