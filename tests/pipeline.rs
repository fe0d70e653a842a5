use candle_core::Tensor;
use candle_onnx::onnx::{GraphProto, ModelProto, ValueInfoProto};
use image::{ImageFormat, Rgba, RgbaImage};
use sortcam::{
    classify, prepare, CapturedImage, Category, FrameSource, InferenceEngine, Model, ModelLoader,
    ModelProvider, OnnxEngine, PipelineError, Prediction, SortApp, UiState,
};
use std::io::Cursor;

fn stub_proto() -> ModelProto {
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

fn png_image(width: u32, height: u32) -> CapturedImage {
    let img = RgbaImage::from_pixel(width, height, Rgba([90, 140, 60, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    CapturedImage {
        bytes,
        width,
        height,
    }
}

struct StubCamera;

impl FrameSource for StubCamera {
    async fn capture(&mut self) -> Result<CapturedImage, PipelineError> {
        Ok(png_image(64, 64))
    }
}

struct StubLoader;

impl ModelLoader for StubLoader {
    fn load(&self) -> Result<Model, PipelineError> {
        Model::from_proto(stub_proto(), (32, 32))
    }
}

struct FixedEngine(Vec<f32>);

impl InferenceEngine for FixedEngine {
    async fn predict(&self, _: &Model, _: &Tensor) -> Result<Prediction, PipelineError> {
        Ok(Prediction::new(self.0.clone()))
    }
}

#[tokio::test]
async fn end_to_end_resolves_recyclable() {
    let mut app = SortApp::new(
        StubCamera,
        ModelProvider::new(StubLoader),
        FixedEngine(vec![0.1, 0.8, 0.1]),
    );
    app.capture_and_classify().await;
    match app.state() {
        UiState::Resolved(category) => assert_eq!(category.to_string(), "Recyclable"),
        other => panic!("expected a resolved category, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_captures_reuse_cached_model() {
    let mut app = SortApp::new(
        StubCamera,
        ModelProvider::new(StubLoader),
        FixedEngine(vec![0.9, 0.0, 0.1]),
    );
    app.capture_and_classify().await;
    assert_eq!(app.state(), UiState::Resolved(Category::Compost));
    app.dismiss();
    app.capture_and_classify().await;
    assert_eq!(app.state(), UiState::Resolved(Category::Compost));
}

#[tokio::test]
async fn engine_rejects_undersized_tensor() {
    let model = Model::from_proto(stub_proto(), (224, 224)).unwrap();
    let tensor = prepare(&png_image(300, 300), (100, 100)).unwrap();
    match OnnxEngine.predict(&model, &tensor).await {
        Err(PipelineError::ShapeMismatch { expected, got }) => {
            assert_eq!(expected, (224, 224));
            assert_eq!(got, (100, 100));
        }
        other => panic!("expected ShapeMismatch, got {:?}", other.err()),
    }
}

#[test]
fn classify_breaks_ties_to_lowest_index() {
    let category = classify(&Prediction::new(vec![0.5, 0.5, 0.2])).unwrap();
    assert_eq!(category, Category::Compost);
}

#[test]
fn classify_rejects_wrong_cardinality() {
    match classify(&Prediction::new(vec![0.5, 0.5])) {
        Err(PipelineError::InferenceError(_)) => {}
        other => panic!("expected InferenceError, got {other:?}"),
    }
}

#[test]
fn prepared_tensor_matches_requested_size() {
    let tensor = prepare(&png_image(120, 80), (32, 32)).unwrap();
    assert_eq!(tensor.dims(), &[32, 32, 3]);
}
