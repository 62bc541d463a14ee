use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hatena(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hatena").unwrap();
    cmd.env("HATENA_CLI_CONFIG_DIR", config_dir.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_flag_prints_version() {
    let dir = TempDir::new().unwrap();
    hatena(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn first_run_materializes_config_and_template() {
    let dir = TempDir::new().unwrap();
    hatena(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    assert!(dir.path().join("config.toml").is_file());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("template.html")).unwrap(),
        "$body$"
    );
}

#[test]
fn config_set_then_get_round_trips() {
    let dir = TempDir::new().unwrap();
    hatena(&dir)
        .args(["config", "set", "blog:username", "someone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("blog:username: someone"));

    hatena(&dir)
        .args(["config", "get", "blog:username"])
        .assert()
        .success()
        .stdout("blog:username: someone\n");

    hatena(&dir)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("List of config:"))
        .stdout(predicate::str::contains("path:pandoc: pandoc"));
}

#[test]
fn unknown_key_fails_with_message() {
    let dir = TempDir::new().unwrap();
    hatena(&dir)
        .args(["config", "get", "blog:nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config blog:nope not found"));
}

#[test]
fn delete_without_blog_settings_aborts_before_any_request() {
    let dir = TempDir::new().unwrap();
    hatena(&dir)
        .args(["delete", "5", "--without-images", "-y"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("This command will delete blog entry"))
        .stderr(predicate::str::contains("blog:username"));
}

#[test]
fn bad_arguments_are_rejected() {
    let dir = TempDir::new().unwrap();
    hatena(&dir).args(["delete", "abc"]).assert().failure();
    hatena(&dir)
        .args(["upload", "t", "p.md", "--publish", "--draft"])
        .assert()
        .failure();
}
