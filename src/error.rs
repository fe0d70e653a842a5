use thiserror::Error;

/// Failure modes of a single pipeline invocation.
///
/// Every variant is caught at the invocation boundary in [`crate::app`] and
/// converted into a state transition back to idle; none of them abort the
/// process.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No camera handle is bound, or the device refused to produce a frame.
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The captured bytes are not a valid still-image encoding.
    #[error("failed to decode captured image: {0}")]
    DecodeError(String),

    /// The model asset is missing, unfetchable, or malformed.
    #[error("failed to load model: {0}")]
    ModelLoadError(String),

    /// Tensor dimensions disagree with the model's declared input size.
    #[error("tensor shape {got:?} does not match model input {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// The model evaluation itself failed, or produced no usable output.
    #[error("inference failed: {0}")]
    InferenceError(String),
}
