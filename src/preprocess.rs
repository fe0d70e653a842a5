use crate::camera::CapturedImage;
use crate::error::PipelineError;
use candle_core::{Device, Tensor};
use image::imageops::FilterType;
use tracing::trace;

/// Drops the alpha channel from an RGBA pixel buffer: source stride is 4
/// bytes per pixel, destination stride is 3. The three colour bytes of each
/// pixel are copied through untouched.
pub fn strip_alpha(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}

/// Turns a captured image into a `[height, width, 3]` u8 tensor at exactly
/// `target` size.
///
/// Decode failures surface as `DecodeError`; this function never resizes a
/// tensor after the fact, so a shape disagreement downstream is a hard error
/// rather than a silent second resize.
pub fn prepare(image: &CapturedImage, target: (u32, u32)) -> Result<Tensor, PipelineError> {
    let (tw, th) = target;
    let img = image::load_from_memory(&image.bytes)
        .map_err(|e| PipelineError::DecodeError(e.to_string()))?;

    // Center-square crop, then scale to the model's input size.
    let (w, h) = (img.width(), img.height());
    let side = w.min(h);
    let cropped = img.crop_imm((w - side) / 2, (h - side) / 2, side, side);
    let resized = cropped.resize_exact(tw, th, FilterType::CatmullRom);

    let rgba = resized.into_rgba8().into_raw();
    let rgb = strip_alpha(&rgba);
    trace!(width = tw, height = th, bytes = rgb.len(), "image prepared");

    Tensor::from_vec(rgb, (th as usize, tw as usize, 3), &Device::Cpu)
        .map_err(|e| PipelineError::DecodeError(format!("failed to create tensor: {e}")))
}
