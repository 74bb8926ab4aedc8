//! Image preprocessing for the digit model
//!
//! Stretches a canvas snapshot to 28x28, converts it to 8-bit luma and
//! remaps intensities to the convention the model was trained on (white
//! ink on black, or a hard black/white threshold).

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Pixel, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConversionError;

/// Side length of the model input
pub const TENSOR_SIDE: u32 = 28;

/// Number of values in the model input
pub const TENSOR_LEN: usize = (TENSOR_SIDE * TENSOR_SIDE) as usize;

/// Intensity remapping policy. Exactly one is applied per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemapMode {
    /// `255 - v`
    #[default]
    Invert,
    /// `v < threshold ? 0 : 255`
    Threshold,
}

/// Resampling filter used to reach 28x28
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    /// Area average over the covered source pixels
    #[default]
    Box,
    /// Nearest neighbour
    Nearest,
}

/// Preprocessing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Active remap policy
    pub remap: RemapMode,
    /// Cut-off for [`RemapMode::Threshold`]
    pub threshold: u8,
    /// Resize filter
    pub resample: ResampleFilter,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remap: RemapMode::Invert,
            threshold: 128,
            resample: ResampleFilter::Box,
        }
    }
}

impl PreprocessConfig {
    /// Threshold mode with the given cut-off
    pub fn threshold(threshold: u8) -> Self {
        Self {
            remap: RemapMode::Threshold,
            threshold,
            ..Default::default()
        }
    }
}

/// 28x28 single-channel model input, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitTensor {
    data: Vec<u8>,
}

impl DigitTensor {
    /// Wrap a 28x28 grayscale image
    pub fn from_gray(image: &GrayImage) -> Result<Self, ConversionError> {
        let (width, height) = image.dimensions();
        if width != TENSOR_SIDE || height != TENSOR_SIDE {
            return Err(ConversionError::BufferSize {
                width: TENSOR_SIDE,
                height: TENSOR_SIDE,
                actual: image.as_raw().len(),
            });
        }
        Ok(Self {
            data: image.as_raw().clone(),
        })
    }

    /// Wrap a raw 784-byte buffer
    pub fn from_raw(data: Vec<u8>) -> Result<Self, ConversionError> {
        if data.len() != TENSOR_LEN {
            return Err(ConversionError::BufferSize {
                width: TENSOR_SIDE,
                height: TENSOR_SIDE,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// A tensor with every value set to `value`
    pub fn filled(value: u8) -> Self {
        Self {
            data: vec![value; TENSOR_LEN],
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Value at column `x`, row `y`
    #[cfg(test)]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * TENSOR_SIDE + x) as usize]
    }

    /// Apply a remap policy to every value
    pub fn remap(&self, mode: RemapMode, threshold: u8) -> Self {
        Self {
            data: self
                .data
                .iter()
                .map(|&v| remap_value(v, mode, threshold))
                .collect(),
        }
    }

    /// Copy into an image for preview display
    pub fn to_gray_image(&self) -> GrayImage {
        // Length is checked on construction
        GrayImage::from_raw(TENSOR_SIDE, TENSOR_SIDE, self.data.clone())
            .unwrap_or_else(|| GrayImage::new(TENSOR_SIDE, TENSOR_SIDE))
    }
}

/// Tensor plus the intermediate image shown in the UI
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Resized grayscale image before remapping
    pub resized: GrayImage,
    /// Remapped model input
    pub tensor: DigitTensor,
}

/// Full preprocessing pipeline: resize, grayscale, remap
pub fn preprocess(bitmap: &RgbImage, config: &PreprocessConfig) -> Result<DigitTensor, ConversionError> {
    preprocess_with_preview(bitmap, config).map(|p| p.tensor)
}

/// Full preprocessing pipeline, keeping the resized image for preview
pub fn preprocess_with_preview(
    bitmap: &RgbImage,
    config: &PreprocessConfig,
) -> Result<Preprocessed, ConversionError> {
    let (width, height) = bitmap.dimensions();
    if width == 0 || height == 0 {
        return Err(ConversionError::EmptyBitmap { width, height });
    }

    // 1. Stretch to the model size, aspect ratio is not preserved
    let resized = resize_to_tensor(bitmap, config.resample);

    // 2. Luma
    let gray = imageops::grayscale(&resized);

    // 3. Remap
    let tensor = DigitTensor::from_gray(&gray)?.remap(config.remap, config.threshold);

    debug!(
        "Preprocessed {}x{} bitmap ({:?}, {:?}, threshold {})",
        width, height, config.resample, config.remap, config.threshold
    );

    Ok(Preprocessed {
        resized: gray,
        tensor,
    })
}

/// Preprocess raw RGB bytes (e.g. from a decoded file)
pub fn preprocess_rgb_bytes(
    data: Vec<u8>,
    width: u32,
    height: u32,
    config: &PreprocessConfig,
) -> Result<Preprocessed, ConversionError> {
    if width == 0 || height == 0 {
        return Err(ConversionError::EmptyBitmap { width, height });
    }
    let actual = data.len();
    let bitmap = RgbImage::from_raw(width, height, data).ok_or(ConversionError::BufferSize {
        width,
        height,
        actual,
    })?;
    preprocess_with_preview(&bitmap, config)
}

fn remap_value(value: u8, mode: RemapMode, threshold: u8) -> u8 {
    match mode {
        RemapMode::Invert => 255 - value,
        RemapMode::Threshold => {
            if value < threshold {
                0
            } else {
                255
            }
        }
    }
}

fn resize_to_tensor(bitmap: &RgbImage, filter: ResampleFilter) -> RgbImage {
    match filter {
        ResampleFilter::Nearest => imageops::resize(bitmap, TENSOR_SIDE, TENSOR_SIDE, FilterType::Nearest),
        ResampleFilter::Box => box_resize(bitmap, TENSOR_SIDE, TENSOR_SIDE),
    }
}

/// Area-average resize.
///
/// Each output pixel is the coverage-weighted mean of the source pixels
/// under its footprint. Works for both shrinking and stretching.
pub fn box_resize<P>(src: &ImageBuffer<P, Vec<u8>>, new_width: u32, new_height: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = src.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let mut out: ImageBuffer<P, Vec<u8>> = ImageBuffer::new(new_width, new_height);
    if width == 0 || height == 0 || new_width == 0 || new_height == 0 {
        return out;
    }

    let sx = width as f32 / new_width as f32;
    let sy = height as f32 / new_height as f32;
    let data = src.as_raw();
    let w = width as usize;

    let mut acc = vec![0.0f32; channels];

    for oy in 0..new_height {
        let y0 = oy as f32 * sy;
        let y1 = y0 + sy;

        for ox in 0..new_width {
            let x0 = ox as f32 * sx;
            let x1 = x0 + sx;

            acc.iter_mut().for_each(|a| *a = 0.0);
            let mut total = 0.0f32;

            let mut y = y0.floor() as u32;
            while (y as f32) < y1 && y < height {
                let wy = (y1.min(y as f32 + 1.0) - y0.max(y as f32)).max(0.0);

                let mut x = x0.floor() as u32;
                while (x as f32) < x1 && x < width {
                    let wx = (x1.min(x as f32 + 1.0) - x0.max(x as f32)).max(0.0);
                    let weight = wx * wy;
                    let idx = (y as usize * w + x as usize) * channels;
                    for c in 0..channels {
                        acc[c] += data[idx + c] as f32 * weight;
                    }
                    total += weight;
                    x += 1;
                }
                y += 1;
            }

            if total > 0.0 {
                let pixel = out.get_pixel_mut(ox, oy);
                for (c, value) in pixel.channels_mut().iter_mut().enumerate() {
                    *value = (acc[c] / total).round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }

    out
}
