use crate::camera::FrameSource;
use crate::error::PipelineError;
use crate::infer::{InferenceEngine, Prediction};
use crate::model::{ModelLoader, ModelProvider};
use crate::preprocess::prepare;
use std::fmt;
use tracing::{debug, info, warn};

/// Display categories, index-aligned with the model's output order.
/// Changing the model's output cardinality means changing this table in
/// lockstep; there is no dynamic discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Compost,
    Recyclable,
    Garbage,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Compost, Category::Recyclable, Category::Garbage];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Compost => "Compost",
            Category::Recyclable => "Recyclable",
            Category::Garbage => "Garbage",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Presenter state machine: `Idle -> Processing -> Resolved -> Idle`.
/// `Resolved` leaves only via explicit dismissal; any pipeline failure goes
/// straight back to `Idle` with no category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Idle,
    Processing,
    Resolved(Category),
}

/// Drives one capture-to-category pipeline invocation at a time and owns
/// the user-visible state.
pub struct SortApp<F, L, E> {
    camera: F,
    models: ModelProvider<L>,
    engine: E,
    state: UiState,
    capture_enabled: bool,
}

impl<F, L, E> SortApp<F, L, E>
where
    F: FrameSource,
    L: ModelLoader,
    E: InferenceEngine,
{
    pub fn new(camera: F, models: ModelProvider<L>, engine: E) -> Self {
        Self {
            camera,
            models,
            engine,
            state: UiState::Idle,
            capture_enabled: true,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn capture_enabled(&self) -> bool {
        self.capture_enabled
    }

    /// Clears a resolved result. No-op in any other state.
    pub fn dismiss(&mut self) {
        if matches!(self.state, UiState::Resolved(_)) {
            self.state = UiState::Idle;
        }
    }

    /// Runs one full pipeline invocation. A request while another is in
    /// flight is ignored before the frame source is touched, so the single
    /// camera handle never sees two concurrent captures.
    pub async fn capture_and_classify(&mut self) {
        if self.state == UiState::Processing {
            debug!("capture ignored: invocation already in flight");
            return;
        }
        if !self.capture_enabled {
            warn!("capture disabled: model failed to load earlier in this session");
            return;
        }
        self.state = UiState::Processing;
        match self.run_pipeline().await {
            Ok(category) => {
                info!(category = category.label(), "item classified");
                self.state = UiState::Resolved(category);
            }
            Err(e) => {
                warn!("pipeline invocation failed: {e}");
                if matches!(e, PipelineError::ModelLoadError(_)) {
                    // Without a model no further capture can succeed.
                    self.capture_enabled = false;
                }
                self.state = UiState::Idle;
            }
        }
    }

    // Stages run strictly in order; no stage starts before its
    // predecessor's result is available.
    async fn run_pipeline(&mut self) -> Result<Category, PipelineError> {
        let image = self.camera.capture().await?;
        let model = self.models.get().await?;
        let (h, w) = model.input_size();
        let tensor = prepare(&image, (w as u32, h as u32))?;
        let prediction = self.engine.predict(model, &tensor).await?;
        classify(&prediction)
    }
}

/// Reduces a score vector to a category by argmax, ties to the lowest
/// index. A cardinality mismatch against the category table is rejected
/// rather than mapped to an arbitrary label.
pub fn classify(prediction: &Prediction) -> Result<Category, PipelineError> {
    if prediction.len() != Category::ALL.len() {
        return Err(PipelineError::InferenceError(format!(
            "expected {} scores, got {}",
            Category::ALL.len(),
            prediction.len()
        )));
    }
    let index = prediction
        .argmax()
        .ok_or_else(|| PipelineError::InferenceError("empty prediction".into()))?;
    Category::from_index(index)
        .ok_or_else(|| PipelineError::InferenceError(format!("no category at index {index}")))
}
