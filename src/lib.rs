pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod error;
pub mod infer;
pub mod model;
pub mod preprocess;

pub use app::{classify, Category, SortApp, UiState};
pub use camera::{CapturedImage, DeviceCamera, FrameSource};
pub use cli::{execute, run_cli, Cli, Commands};
pub use config::{load_config, Config};
pub use error::PipelineError;
pub use infer::{InferenceEngine, OnnxEngine, Prediction};
pub use model::{Model, ModelLoader, ModelProvider, OnnxLoader};
pub use preprocess::{prepare, strip_alpha};
