#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::{
    path::Path,
    process::{Command, Output},
};

fn ctxswitch(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ctxswitch"))
        .arg("--config-dir")
        .arg(config_dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn register_switch_and_quick_access() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("cfg");
    let alpha = dir.path().join("alpha");
    std::fs::create_dir(&alpha).unwrap();
    let alpha_str = alpha.to_str().unwrap();

    assert!(ctxswitch(&cfg, &["init"]).status.success());
    let out = ctxswitch(&cfg, &["register", "alpha", alpha_str, "-d", "payments"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let out = ctxswitch(&cfg, &["switch", "alpha"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let out = ctxswitch(&cfg, &["quick", "set", "port", "8080"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let out = ctxswitch(&cfg, &["quick", "get", "port"]);
    assert_eq!(stdout(&out).trim(), "8080");

    let out = ctxswitch(&cfg, &["active", "--json"]);
    let active: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(active["name"], "alpha");
    assert_eq!(active["cache_status"], "hot");
    assert_eq!(active["quick_access"]["port"], 8080);

    let out = ctxswitch(&cfg, &["list", "--hot"]);
    assert!(stdout(&out).contains("alpha"));
}

#[test]
fn unknown_project_suggests_close_names() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("cfg");
    let web = dir.path().join("web");
    std::fs::create_dir(&web).unwrap();

    ctxswitch(&cfg, &["init"]);
    ctxswitch(&cfg, &["register", "webapp", web.to_str().unwrap()]);

    let out = ctxswitch(&cfg, &["switch", "webap"]);
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("not found"), "{err}");
    assert!(err.contains("did you mean: webapp"), "{err}");
}

#[test]
fn missing_registry_points_at_init() {
    let dir = tempfile::tempdir().unwrap();
    let out = ctxswitch(dir.path(), &["list"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("ctxswitch init"));
}

#[test]
fn removing_active_project_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("cfg");
    let alpha = dir.path().join("alpha");
    std::fs::create_dir(&alpha).unwrap();

    ctxswitch(&cfg, &["init"]);
    ctxswitch(&cfg, &["register", "alpha", alpha.to_str().unwrap()]);
    ctxswitch(&cfg, &["switch", "alpha"]);

    let out = ctxswitch(&cfg, &["remove", "alpha"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("ctxswitch clear"));

    assert!(ctxswitch(&cfg, &["clear"]).status.success());
    assert!(ctxswitch(&cfg, &["remove", "alpha"]).status.success());
}
