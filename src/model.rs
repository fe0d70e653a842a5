use crate::error::PipelineError;
use candle_onnx::onnx::ModelProto;
use hf_hub::api::sync::Api;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// A loaded classification model: the ONNX graph plus the metadata the
/// engine needs to drive it. Never mutated after loading.
pub struct Model {
    pub(crate) proto: ModelProto,
    input_name: String,
    output_name: String,
    input_size: (usize, usize),
}

impl Model {
    /// Wraps a parsed ONNX graph, extracting its input/output bindings.
    /// A proto without a graph or without named ports is `ModelLoadError`.
    pub fn from_proto(proto: ModelProto, input_size: (usize, usize)) -> Result<Self, PipelineError> {
        let graph = proto
            .graph
            .as_ref()
            .ok_or_else(|| PipelineError::ModelLoadError("model graph missing".into()))?;
        let input_name = graph
            .input
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| PipelineError::ModelLoadError("model has no input".into()))?;
        let output_name = graph
            .output
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| PipelineError::ModelLoadError("model has no output".into()))?;
        Ok(Self {
            proto,
            input_name,
            output_name,
            input_size,
        })
    }

    /// Expected `(height, width)` of the input tensor's leading dimensions.
    pub fn input_size(&self) -> (usize, usize) {
        self.input_size
    }

    pub(crate) fn input_name(&self) -> &str {
        &self.input_name
    }

    pub(crate) fn output_name(&self) -> &str {
        &self.output_name
    }
}

/// Reads a model artifact from wherever it lives. Split out as a trait so
/// the provider's caching can be exercised without a real ONNX file.
pub trait ModelLoader {
    fn load(&self) -> Result<Model, PipelineError>;
}

/// Loads an ONNX file from disk, falling back to a Hugging Face Hub fetch
/// when the local path is absent and a repo is configured.
pub struct OnnxLoader {
    path: PathBuf,
    repo: Option<String>,
    input_size: (usize, usize),
}

impl OnnxLoader {
    pub fn new(path: PathBuf, repo: Option<String>, input_size: (usize, usize)) -> Self {
        Self {
            path,
            repo,
            input_size,
        }
    }

    fn resolve_path(&self) -> Result<PathBuf, PipelineError> {
        if self.path.exists() {
            return Ok(self.path.clone());
        }
        let Some(repo) = &self.repo else {
            return Err(PipelineError::ModelLoadError(format!(
                "model file {} not found and no hub repo configured",
                self.path.display()
            )));
        };
        let filename = self.path.to_string_lossy().into_owned();
        info!(repo, filename, "fetching model from hub");
        Api::new()
            .and_then(|api| api.model(repo.clone()).get(&filename))
            .map_err(|e| PipelineError::ModelLoadError(format!("failed to fetch model: {e}")))
    }
}

impl ModelLoader for OnnxLoader {
    fn load(&self) -> Result<Model, PipelineError> {
        let path = self.resolve_path()?;
        let proto = candle_onnx::read_file(&path)
            .map_err(|e| PipelineError::ModelLoadError(e.to_string()))?;
        debug!(path = %path.display(), "model loaded");
        Model::from_proto(proto, self.input_size)
    }
}

/// Process-lifetime model cache. The first successful `get` runs the loader;
/// every later call returns the same cached instance without touching the
/// asset again. A failed load leaves the cell empty, so the next call
/// retries rather than serving a partial model.
pub struct ModelProvider<L> {
    loader: L,
    cell: OnceCell<Model>,
}

impl<L: ModelLoader> ModelProvider<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<&Model, PipelineError> {
        self.cell
            .get_or_try_init(|| async { self.loader.load() })
            .await
    }
}

/// Minimal graph with named ports, for exercising the cache and the
/// engine's shape validation without a real ONNX asset.
#[cfg(test)]
pub(crate) fn stub_proto() -> ModelProto {
    use candle_onnx::onnx::{GraphProto, ValueInfoProto};

    let mut graph = GraphProto::default();
    graph.input.push(ValueInfoProto {
        name: "images".into(),
        ..Default::default()
    });
    graph.output.push(ValueInfoProto {
        name: "scores".into(),
        ..Default::default()
    });
    ModelProto {
        graph: Some(graph),
        ..Default::default()
    }
}
