use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn make_home() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

fn run(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tokentrack"))
        .args(args)
        .env("HOME", home)
        .env("TOKENTRACK_CONFIG", home.join("tokentrack.toml"))
        .env("TOKENTRACK_TOKEN_FILE", home.join("session-token"))
        // Unroutable so nothing reaches a real server.
        .env("TOKENTRACK_SERVER_URL", "http://127.0.0.1:9/api")
        .env_remove("RUST_LOG")
        .output()
        .expect("run tokentrack")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn config_set_then_show_round_trips() {
    let home = make_home();

    let set = run(
        home.path(),
        &["config", "set", "--server", "https://usage.example.com/api/", "--timeout", "5"],
    );
    assert!(set.status.success(), "stderr: {}", stderr(&set));

    let written = fs::read_to_string(home.path().join("tokentrack.toml")).expect("config file");
    assert!(written.contains("url = \"https://usage.example.com/api\""));
    assert!(written.contains("timeout_secs = 5"));

    let show = run(home.path(), &["config", "show"]);
    assert!(show.status.success(), "stderr: {}", stderr(&show));
    let out = stdout(&show);
    assert!(out.contains("timeout_secs = 5"));
    // The env override wins for the effective value but is never saved.
    assert!(out.contains("http://127.0.0.1:9/api"));
}

#[test]
fn config_set_rejects_non_http_url() {
    let home = make_home();

    let out = run(home.path(), &["config", "set", "--server", "ftp://example.com"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Error: Server URL must start with http"));
    assert!(!home.path().join("tokentrack.toml").exists());
}

#[test]
fn config_set_without_values_fails() {
    let home = make_home();
    let out = run(home.path(), &["config", "set"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Nothing to set"));
}

#[test]
fn models_lists_builtin_and_configured_entries() {
    let home = make_home();
    fs::write(
        home.path().join("tokentrack.toml"),
        "[dashboard]\ndefault_model = \"gpt-4\"\n\n[[models]]\nid = \"mistral-7b\"\nname = \"Mistral 7B\"\ncost_per_token = 0.000001\n",
    )
    .expect("write config");

    let out = run(home.path(), &["models"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let listed = stdout(&out);
    assert!(listed.contains("gpt-3.5-turbo"));
    assert!(listed.contains("claude-2"));
    assert!(listed.contains("mistral-7b"));
    assert!(listed.lines().any(|l| l.starts_with("* gpt-4 ")));
}

#[test]
fn data_commands_require_a_session() {
    let home = make_home();
    for args in [&["logs"][..], &["dashboard"], &["export"]] {
        let out = run(home.path(), args);
        assert_eq!(out.status.code(), Some(1), "{args:?}");
        assert!(stderr(&out).contains("Not signed in"), "{args:?}");
    }
}

#[test]
fn logout_and_whoami_succeed_when_signed_out() {
    let home = make_home();

    let logout = run(home.path(), &["logout"]);
    assert!(logout.status.success(), "stderr: {}", stderr(&logout));
    assert!(stdout(&logout).contains("Signed out"));

    let whoami = run(home.path(), &["whoami"]);
    assert!(whoami.status.success(), "stderr: {}", stderr(&whoami));
    assert!(stdout(&whoami).contains("Not signed in"));
}

#[test]
fn logout_removes_stored_token() {
    let home = make_home();
    let token = home.path().join("session-token");
    fs::write(&token, "stale-token").expect("write token");

    let out = run(home.path(), &["logout"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(!token.exists());
}
