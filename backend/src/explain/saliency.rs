use image::RgbImage;
use ndarray::Array2;

use super::render;
use crate::model::{Classifier, InferenceError, preprocess};

const HEATMAP_WEIGHT: f32 = 0.4;
const IMAGE_WEIGHT: f32 = 0.6;

/// Per-pixel sensitivity of the target class score to the input image,
/// normalized to [0,1]. Defaults to the predicted class.
pub fn saliency_map(
    classifier: &Classifier,
    img: &RgbImage,
    class_idx: Option<i64>,
) -> Result<Array2<f32>, InferenceError> {
    let input = preprocess::to_tensor(img, classifier.normalization(), classifier.device());
    let (grad, _) = classifier.input_gradient(&input, class_idx)?;
    // collapse to one channel: strongest absolute gradient across RGB
    let map = grad
        .abs()
        .amax([1i64].as_slice(), false)
        .squeeze_dim(0)
        .clamp_min(0.0);
    Ok(render::normalize_intensity(super::tensor_to_array2(&map)?))
}

pub fn render_saliency(original: &RgbImage, map: &Array2<f32>) -> RgbImage {
    render::overlay_heatmap(original, map, HEATMAP_WEIGHT, IMAGE_WEIGHT)
}
