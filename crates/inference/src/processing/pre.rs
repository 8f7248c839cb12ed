use crate::error::PredictError;
use common::span_debug;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use ndarray::{Array, IxDyn};

#[derive(Debug)]
pub struct PreprocessedImage {
    /// `[1, 3, H, W]` in `[0, 1]`
    pub tensor: Array<f32, IxDyn>,
    /// Decoded image `(width, height)` before resizing.
    pub original_size: (u32, u32),
}

/// Decode, stretch to the model input size and convert to a CHW tensor.
///
/// No letterboxing: the aspect ratio is not preserved, which is what the
/// per-axis scale factors in post-processing undo.
pub struct PreProcessor {
    pub input_size: (u32, u32),
}

impl PreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self { input_size }
    }

    pub fn preprocess(&self, image_bytes: &[u8]) -> Result<PreprocessedImage, PredictError> {
        let rgb = Self::decode(image_bytes)?;
        let original_size = rgb.dimensions();

        tracing::trace!(
            width = original_size.0,
            height = original_size.1,
            bytes = image_bytes.len(),
            "Preprocessing image"
        );

        let resized = self.resize(rgb)?;
        let tensor = Self::normalize(&resized)?;

        Ok(PreprocessedImage {
            tensor,
            original_size,
        })
    }

    fn decode(image_bytes: &[u8]) -> Result<RgbImage, PredictError> {
        let _s = span_debug!("decode_image");
        Ok(image::load_from_memory(image_bytes)?.to_rgb8())
    }

    fn resize(&self, rgb: RgbImage) -> Result<Image<'static>, PredictError> {
        let _s = span_debug!("resize");

        let (width, height) = rgb.dimensions();
        let src = Image::from_vec_u8(width, height, rgb.into_raw(), PixelType::U8x3)
            .map_err(|e| PredictError::Preprocess(e.to_string()))?;

        let mut resized = Image::new(self.input_size.0, self.input_size.1, PixelType::U8x3);

        Resizer::new()
            .resize(
                &src,
                &mut resized,
                &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
            )
            .map_err(|e| PredictError::Preprocess(e.to_string()))?;

        Ok(resized)
    }

    fn normalize(image: &Image) -> Result<Array<f32, IxDyn>, PredictError> {
        let _s = span_debug!("normalize");

        let width = image.width() as usize;
        let height = image.height() as usize;
        let spatial = width * height;

        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in image.buffer().chunks_exact(3).enumerate() {
            output[i] = px[0] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[2] as f32 / 255.0;
        }

        Array::from_shape_vec(IxDyn(&[1, 3, height, width]), output)
            .map_err(|e| PredictError::Preprocess(e.to_string()))
    }
}
