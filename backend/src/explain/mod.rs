pub mod gradcam;
pub mod render;
pub mod saliency;

use ndarray::Array2;
use tch::{Kind, Tensor};

use crate::model::InferenceError;

/// Copies a 2-d float tensor into an ndarray intensity map.
pub(crate) fn tensor_to_array2(tensor: &Tensor) -> Result<Array2<f32>, InferenceError> {
    let size = tensor.size();
    let (height, width) = match size.as_slice() {
        [h, w] => (*h as usize, *w as usize),
        _ => return Err(InferenceError::Shape(size)),
    };
    let flat = tensor.to_kind(Kind::Float).contiguous().view([-1]);
    let mut data = vec![0.0f32; height * width];
    flat.copy_data(&mut data, height * width);
    Array2::from_shape_vec((height, width), data).map_err(|_| InferenceError::Shape(size))
}
