//! Integration tests for keylatch
//!
//! Every test runs against the `memory://` store so no server is needed.

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn keylatch() -> Command {
        let mut cmd = cargo_bin_cmd!("keylatch");
        cmd.env_remove("KEYLATCH_CONFIG")
            .env_remove("KEYLATCH_STORE_URL")
            .args(["--store", "memory://"]);
        cmd
    }

    #[test]
    fn help_displays() {
        keylatch()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("TTL locks and ephemeral cache"));
    }

    #[test]
    fn version_displays() {
        keylatch()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("keylatch"));
    }

    #[test]
    fn config_path() {
        keylatch()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        keylatch()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[lock]"))
            .stdout(predicate::str::contains("max_attempts = 10"));
    }

    #[test]
    fn config_init_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        keylatch()
            .args(["config", "init", "--config"])
            .arg(&path)
            .assert()
            .success();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[cache]"));
    }

    #[test]
    fn store_url_from_environment() {
        let mut cmd = cargo_bin_cmd!("keylatch");
        cmd.env_remove("KEYLATCH_CONFIG")
            .env("KEYLATCH_STORE_URL", "memory://")
            .args(["cache", "get", "anything"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{}"));
    }

    #[test]
    fn unsupported_store_url_fails_with_hint() {
        let mut cmd = cargo_bin_cmd!("keylatch");
        cmd.env_remove("KEYLATCH_CONFIG")
            .env("KEYLATCH_STORE_URL", "memcached://localhost")
            .args(["cache", "get", "anything"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported store URL"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn cache_miss_prints_empty_object() {
        keylatch()
            .args(["cache", "get", "missing"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{}"));
    }

    #[test]
    fn cache_set_rejects_non_object() {
        keylatch()
            .args(["cache", "set", "k", "[1,2]"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("JSON object"));
    }

    #[test]
    fn cache_set_accepts_object() {
        keylatch()
            .args(["cache", "set", "k", r#"{"v":1}"#, "--ttl", "5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cached"));
    }

    #[test]
    fn cache_del_missing_reports_zero() {
        keylatch()
            .args(["cache", "del", "missing"])
            .assert()
            .success()
            .stdout(predicate::str::contains("0"));
    }

    #[test]
    fn lock_inspect_free() {
        keylatch()
            .args(["lock", "inspect", "deploy"])
            .assert()
            .success()
            .stdout(predicate::str::contains("free"));
    }

    #[test]
    fn lock_release_unheld_is_ok() {
        keylatch()
            .args(["lock", "release", "deploy"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Released lock"));
    }

    #[cfg(unix)]
    #[test]
    fn lock_run_passes_exit_code_through() {
        keylatch()
            .args(["lock", "run", "deploy", "--", "sh", "-c", "exit 3"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Acquired lock"))
            .stderr(predicate::str::contains("Released lock"));
    }

    #[cfg(unix)]
    #[test]
    fn lock_run_success() {
        keylatch()
            .args(["lock", "run", "deploy", "--ttl", "10", "--", "true"])
            .assert()
            .success();
    }

    #[test]
    fn lock_run_missing_program_fails() {
        keylatch()
            .args(["lock", "run", "deploy", "--", "keylatch-no-such-program"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Command failed"));
    }
}
