use crate::error::PipelineError;
use image::ImageFormat;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
    Camera,
};
use std::io::Cursor;
use tracing::{debug, error};

/// One still capture: encoded image bytes plus pixel dimensions.
///
/// The bytes are a self-describing still-image encoding (PNG), whatever wire
/// format the camera itself produced. Decoding happens in the preprocessor.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Produces a still image on demand. The device implementation suspends
/// while the shutter operates; test doubles resolve immediately.
pub trait FrameSource {
    fn capture(
        &mut self,
    ) -> impl std::future::Future<Output = Result<CapturedImage, PipelineError>>;
}

/// Live camera backed by nokhwa. The handle is held explicitly and bound
/// once via [`DeviceCamera::bind`]; capturing without a bound handle fails
/// with `DeviceUnavailable` instead of panicking.
pub struct DeviceCamera {
    handle: Option<Camera>,
}

impl DeviceCamera {
    pub fn unbound() -> Self {
        Self { handle: None }
    }

    /// Opens the camera at `index`, walking a resolution/format fallback
    /// ladder since devices rarely honour the first requested mode.
    pub fn bind(index: u32) -> Result<Self, PipelineError> {
        let mut cam = None;
        for (w, h) in [(1280, 720), (640, 480)] {
            for fmt in [FrameFormat::RAWRGB, FrameFormat::MJPEG, FrameFormat::YUYV] {
                let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                    CameraFormat::new_from(w, h, fmt, 30),
                ));
                match Camera::new(CameraIndex::Index(index), req) {
                    Ok(c) => {
                        cam = Some(c);
                        break;
                    }
                    Err(_) => continue,
                }
            }
            if cam.is_some() {
                break;
            }
        }
        let mut cam = cam
            .or_else(|| {
                let any = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
                Camera::new(CameraIndex::Index(index), any).ok()
            })
            .ok_or_else(|| {
                error!(index, "failed to open camera");
                PipelineError::DeviceUnavailable(format!("no camera at index {index}"))
            })?;
        cam.open_stream()
            .map_err(|e| PipelineError::DeviceUnavailable(format!("failed to open stream: {e}")))?;
        debug!(format = ?cam.camera_format(), "camera stream opened");
        Ok(Self { handle: Some(cam) })
    }
}

impl FrameSource for DeviceCamera {
    async fn capture(&mut self) -> Result<CapturedImage, PipelineError> {
        let cam = self
            .handle
            .as_mut()
            .ok_or_else(|| PipelineError::DeviceUnavailable("no camera handle bound".into()))?;
        let frame = cam
            .frame()
            .map_err(|e| PipelineError::DeviceUnavailable(format!("failed to capture frame: {e}")))?;
        let img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| PipelineError::DecodeError(format!("failed to decode frame: {e}")))?;
        let (width, height) = (img.width(), img.height());
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| PipelineError::DecodeError(format!("failed to encode frame: {e}")))?;
        debug!(width, height, "frame captured");
        Ok(CapturedImage {
            bytes,
            width,
            height,
        })
    }
}
