use crate::app::{SortApp, UiState};
use crate::camera::DeviceCamera;
use crate::config::load_config;
use crate::error::PipelineError;
use crate::infer::OnnxEngine;
use crate::model::{ModelProvider, OnnxLoader};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

#[derive(Parser)]
#[command(name = "sortcam", version, about = "Waste-sorting camera classifier")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive session: Enter captures, Enter dismisses, q quits
    Run {
        /// Camera device index
        #[arg(short, long)]
        camera: Option<u32>,
        /// Path to the ONNX model
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Capture one photo and print its category
    Classify {
        /// Camera device index
        #[arg(short, long)]
        camera: Option<u32>,
        /// Path to the ONNX model
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

pub async fn run_cli() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    execute(cli).await;
}

pub async fn execute(cli: Cli) {
    match cli.command {
        Commands::Run { camera, model } => run_session(camera, model).await,
        Commands::Classify { camera, model } => classify_once(camera, model).await,
    }
}

type DeviceApp = SortApp<DeviceCamera, OnnxLoader, OnnxEngine>;

fn build_app(camera: Option<u32>, model: Option<PathBuf>) -> Result<DeviceApp, PipelineError> {
    let cfg = load_config();
    let index = camera.unwrap_or(cfg.camera_index);
    let path = model.unwrap_or(cfg.model_path);
    let size = cfg.input_size as usize;
    let loader = OnnxLoader::new(path, cfg.model_repo, (size, size));
    let camera = DeviceCamera::bind(index)?;
    Ok(SortApp::new(camera, ModelProvider::new(loader), OnnxEngine))
}

async fn classify_once(camera: Option<u32>, model: Option<PathBuf>) {
    let mut app = match build_app(camera, model) {
        Ok(app) => app,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    app.capture_and_classify().await;
    match app.state() {
        UiState::Resolved(category) => println!("{category}"),
        _ => error!("no category resolved"),
    }
}

async fn run_session(camera: Option<u32>, model: Option<PathBuf>) {
    let mut app = match build_app(camera, model) {
        Ok(app) => app,
        Err(e) => {
            error!("{e}");
            return;
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match app.state() {
            UiState::Resolved(category) => {
                println!("This item is... {category}");
                println!("[Enter] dismiss  [q] quit");
            }
            _ => println!("[Enter] capture  [q] quit"),
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        if line.trim() == "q" {
            break;
        }
        match app.state() {
            UiState::Resolved(_) => app.dismiss(),
            UiState::Idle => {
                println!("processing...");
                app.capture_and_classify().await;
            }
            UiState::Processing => {}
        }
        if !app.capture_enabled() {
            error!("model unavailable, ending session");
            break;
        }
    }
}
