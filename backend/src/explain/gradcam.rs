use image::RgbImage;
use ndarray::Array2;

use super::render;
use crate::model::{Classifier, InferenceError, preprocess};

const IMAGE_WEIGHT: f32 = 0.6;
const HEATMAP_WEIGHT: f32 = 0.4;

/// Grad-CAM intensity map at the configured backbone output, normalized to
/// [0,1]. A rectified constant-zero activation sum stays all-zero.
pub fn gradcam_map(
    classifier: &Classifier,
    img: &RgbImage,
    class_idx: Option<i64>,
) -> Result<Array2<f32>, InferenceError> {
    let input = preprocess::to_tensor(img, classifier.normalization(), classifier.device());
    let (cam, _) = classifier.class_activation_map(&input, class_idx)?;
    Ok(render::normalize_intensity(super::tensor_to_array2(&cam)?))
}

pub fn render_gradcam(original: &RgbImage, map: &Array2<f32>) -> RgbImage {
    render::overlay_heatmap(original, map, HEATMAP_WEIGHT, IMAGE_WEIGHT)
}
