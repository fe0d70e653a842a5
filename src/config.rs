use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

/// Startup configuration. Everything has a usable default, so a missing or
/// unreadable file is not an error.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Device index of the camera to bind.
    pub camera_index: u32,
    /// Local path of the ONNX model asset.
    pub model_path: PathBuf,
    /// Hugging Face Hub repo to fetch the model from when the local path is
    /// absent.
    pub model_repo: Option<String>,
    /// Side length of the model's square input, in pixels.
    pub input_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            model_path: PathBuf::from("waste-classifier.onnx"),
            model_repo: None,
            input_size: 224,
        }
    }
}

fn config_path() -> PathBuf {
    env::var_os("SORTCAM_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sortcam.json"))
}

pub fn load_config() -> Config {
    let path = config_path();
    if let Ok(data) = fs::read(&path) {
        if let Ok(cfg) = serde_json::from_slice(&data) {
            return cfg;
        }
    }
    Config::default()
}
