use image::{DynamicImage, imageops::FilterType};

use crate::error::AnalysisError;

pub const INPUT_SIZE: u32 = 224;
pub const CHANNELS: usize = 3;

/// A single RGB image as `f32` values in `[0, 1]`, laid out NHWC with a batch of one.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    pub data: Vec<f32>,
}

impl ImageTensor {
    pub const SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, CHANNELS];
}

pub fn preprocess_image(bytes: &[u8]) -> Result<ImageTensor, AnalysisError> {
    let image = image::load_from_memory(bytes).map_err(|e| AnalysisError::Image(e.to_string()))?;

    let resized = DynamicImage::from(image.to_rgb8()).resize_exact(
        INPUT_SIZE,
        INPUT_SIZE,
        FilterType::CatmullRom,
    );

    let data = resized
        .to_rgb8()
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect();

    Ok(ImageTensor { data })
}
