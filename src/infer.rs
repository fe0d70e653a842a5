use crate::error::PipelineError;
use crate::model::Model;
use candle_core::{DType, Tensor};
use candle_onnx::simple_eval;
use std::collections::HashMap;
use tracing::debug;

/// Score vector over the model's label set, index-aligned with the fixed
/// category table.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    scores: Vec<f32>,
}

impl Prediction {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Index of the highest score. Ties break to the lowest index.
    pub fn argmax(&self) -> Option<usize> {
        self.scores
            .iter()
            .enumerate()
            .fold(None, |best, (i, &s)| match best {
                Some((_, b)) if s <= b => best,
                _ => Some((i, s)),
            })
            .map(|(i, _)| i)
    }
}

/// Runs a prepared tensor through a loaded model. Trait seam so the
/// presenter can be driven by a canned engine in tests.
pub trait InferenceEngine {
    fn predict(
        &self,
        model: &Model,
        tensor: &Tensor,
    ) -> impl std::future::Future<Output = Result<Prediction, PipelineError>>;
}

/// candle-onnx evaluation. Single-image only: the batch dimension is always
/// added here, never expected from the preprocessor.
pub struct OnnxEngine;

impl OnnxEngine {
    /// Rejects any tensor whose leading two dimensions disagree with the
    /// model's declared input size. Validation happens before any tensor
    /// conversion so a mismatch can never be silently resized away.
    fn check_shape(model: &Model, tensor: &Tensor) -> Result<(), PipelineError> {
        let dims = tensor.dims();
        let expected = model.input_size();
        let got = (
            dims.first().copied().unwrap_or(0),
            dims.get(1).copied().unwrap_or(0),
        );
        if dims.len() != 3 || dims[2] != 3 || got != expected {
            return Err(PipelineError::ShapeMismatch { expected, got });
        }
        Ok(())
    }
}

impl InferenceEngine for OnnxEngine {
    async fn predict(&self, model: &Model, tensor: &Tensor) -> Result<Prediction, PipelineError> {
        Self::check_shape(model, tensor)?;

        // HWC u8 -> batched NCHW f32 in [0, 1].
        let prepared = tensor
            .permute((2, 0, 1))
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.affine(1.0 / 255.0, 0.0))
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| PipelineError::InferenceError(format!("failed to prepare tensor: {e}")))?;

        let mut inputs = HashMap::new();
        inputs.insert(model.input_name().to_string(), prepared);
        let mut outputs = simple_eval(&model.proto, inputs)
            .map_err(|e| PipelineError::InferenceError(format!("failed to run model: {e}")))?;
        let output = outputs
            .remove(model.output_name())
            .ok_or_else(|| PipelineError::InferenceError("model output missing".into()))?;

        let scores = output
            .flatten_all()
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| PipelineError::InferenceError(format!("failed to read output: {e}")))?;
        debug!(?scores, "prediction complete");
        Ok(Prediction::new(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::stub_proto;
    use candle_core::Device;

    fn zero_tensor(h: usize, w: usize) -> Tensor {
        Tensor::zeros((h, w, 3), DType::U8, &Device::Cpu).unwrap()
    }

    #[test]
    fn argmax_picks_highest() {
        let p = Prediction::new(vec![0.1, 0.8, 0.1]);
        assert_eq!(p.argmax(), Some(1));
    }

    #[test]
    fn argmax_tie_breaks_to_first() {
        let p = Prediction::new(vec![0.5, 0.5, 0.2]);
        assert_eq!(p.argmax(), Some(0));
    }

    #[test]
    fn argmax_empty_is_none() {
        assert_eq!(Prediction::new(vec![]).argmax(), None);
    }

    #[tokio::test]
    async fn predict_rejects_wrong_shape() {
        let model = Model::from_proto(stub_proto(), (224, 224)).unwrap();
        let tensor = zero_tensor(100, 100);
        match OnnxEngine.predict(&model, &tensor).await {
            Err(PipelineError::ShapeMismatch { expected, got }) => {
                assert_eq!(expected, (224, 224));
                assert_eq!(got, (100, 100));
            }
            other => panic!("expected ShapeMismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn check_shape_accepts_exact_match() {
        let model = Model::from_proto(stub_proto(), (224, 224)).unwrap();
        let tensor = zero_tensor(224, 224);
        assert!(OnnxEngine::check_shape(&model, &tensor).is_ok());
    }
}
