#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::{fs, io, io::Write};

use {
    chrono::Utc,
    ctxswitch_config::{CtxswitchConfig, Paths},
    ctxswitch_registry::{
        RegistryEngine, RegistryStore,
        atomic::write_atomic_with,
        lock::{LockManager, LockMarker, LockPolicy},
    },
};

#[test]
fn crash_before_rename_keeps_previous_registry() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let engine = RegistryEngine::new(&paths, &CtxswitchConfig::default());
    engine.init().unwrap();
    let work = dir.path().join("alpha");
    fs::create_dir(&work).unwrap();
    engine.register("alpha", &work, None).unwrap();
    let before = engine.load().unwrap();

    let mut next = before.clone();
    next.projects.clear();
    let bytes = serde_json::to_vec_pretty(&next).unwrap();
    let result = write_atomic_with(paths.registry(), |file| {
        file.write_all(&bytes[..bytes.len() / 2])?;
        Err(io::Error::other("process killed"))
    });
    assert!(result.is_err());

    assert_eq!(RegistryStore::new(paths.registry()).load().unwrap(), before);
    let temp_files: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(temp_files.is_empty());
}

#[test]
fn crashed_holder_lock_is_reclaimed_by_next_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let mut config = CtxswitchConfig::default();
    config.lock.stale_after_secs = 30;
    config.lock.timeout_ms = 1_000;
    let engine = RegistryEngine::new(&paths, &config);
    engine.init().unwrap();

    // A holder that died a minute ago without releasing.
    let marker = LockMarker {
        pid: 1,
        acquired_at: Utc::now() - chrono::Duration::seconds(60),
    };
    fs::write(paths.lock(), serde_json::to_vec(&marker).unwrap()).unwrap();

    let work = dir.path().join("alpha");
    fs::create_dir(&work).unwrap();
    engine.register("alpha", &work, None).unwrap();
    assert!(!paths.lock().exists());

    // The reclaim guard file is left behind but never blocks anyone.
    let lock = LockManager::new(paths.lock(), LockPolicy::from(&config.lock));
    lock.acquire().unwrap().release().unwrap();
}
