use serial_test::serial;
use sortcam::{load_config, Config};
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
#[serial]
fn config_uses_env_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sortcam.json");
    std::fs::write(&path, r#"{"camera_index":2,"input_size":128}"#).unwrap();
    std::env::set_var("SORTCAM_CONFIG", &path);

    let cfg = load_config();
    assert_eq!(cfg.camera_index, 2);
    assert_eq!(cfg.input_size, 128);
    // Fields absent from the file keep their defaults.
    assert_eq!(cfg.model_path, PathBuf::from("waste-classifier.onnx"));
    assert!(cfg.model_repo.is_none());
}

#[test]
#[serial]
fn config_defaults_when_file_missing() {
    let dir = tempdir().unwrap();
    std::env::set_var("SORTCAM_CONFIG", dir.path().join("absent.json"));
    assert_eq!(load_config(), Config::default());
}

#[test]
#[serial]
fn config_defaults_on_malformed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sortcam.json");
    std::fs::write(&path, "not json").unwrap();
    std::env::set_var("SORTCAM_CONFIG", &path);
    assert_eq!(load_config(), Config::default());
}
