// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use volt_app_core::config::{ConfigError, ConfigService, ConfigStore};
use volt_app_core::prefs::SimPrefs;
use volt_app_core::prefs_port::PrefsPort;
use volt_config_fs::FsConfigStore;

#[test]
fn missing_key_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsConfigStore::with_base(dir.path()).expect("store");
    assert!(matches!(store.load_raw("sim"), Err(ConfigError::NotFound)));
}

#[test]
fn with_base_creates_nested_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("a").join("b");
    let store = FsConfigStore::with_base(&base).expect("store");
    assert!(base.is_dir());
    assert_eq!(store.path_for("sim"), base.join("sim.json"));
}

#[test]
fn prefs_round_trip_through_json_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = ConfigService::new(FsConfigStore::with_base(dir.path()).expect("store"));
    assert_eq!(service.load_prefs().expect("defaults"), SimPrefs::default());

    let mut prefs = SimPrefs::default();
    prefs.circuit.iteration_limit = 250;
    service.save_prefs(&prefs).expect("save");

    let on_disk = std::fs::read_to_string(dir.path().join("sim.json")).expect("file");
    assert!(on_disk.contains("\"iteration_limit\": 250"));
    assert_eq!(service.load_prefs().expect("load"), prefs);
}

#[test]
fn keys_outside_the_base_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsConfigStore::with_base(dir.path().join("cfg")).expect("store");
    for key in ["../escape", "a/b", "", "sim.json"] {
        assert!(
            matches!(store.save_raw(key, b"{}"), Err(ConfigError::Other(_))),
            "{key:?} was accepted"
        );
        assert!(matches!(store.load_raw(key), Err(ConfigError::Other(_))));
    }
    assert!(!dir.path().join("escape.json").exists());
    assert!(store.keys().expect("keys").is_empty());
}

#[test]
fn saves_replace_whole_files_and_list_as_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsConfigStore::with_base(dir.path()).expect("store");
    store.save_raw("sim", b"{\"a\":1}").expect("save");
    store.save_raw("sim", b"{}").expect("overwrite");
    store.save_raw("ui-layout", b"[]").expect("save");
    std::fs::write(dir.path().join("notes.txt"), "ignored").expect("stray file");

    assert_eq!(store.load_raw("sim").expect("load"), b"{}");
    assert_eq!(store.keys().expect("keys"), ["sim", "ui-layout"]);
    assert!(!dir.path().join("sim.json.tmp").exists());
}
