use image::{DynamicImage, RgbImage, imageops::FilterType};
use tch::{Device, Tensor};

use super::InferenceError;
use crate::config::NormalizationSpec;

pub fn decode_image(data: &[u8]) -> Result<DynamicImage, InferenceError> {
    image::load_from_memory(data).map_err(|e| InferenceError::Preprocessing(e.to_string()))
}

/// Aspect-ignoring resize to the fixed working resolution. An image that is
/// already exactly sized is returned untouched.
pub fn resize_to_input(img: &DynamicImage, size: u32) -> RgbImage {
    let rgb = img.to_rgb8();
    if rgb.dimensions() == (size, size) {
        return rgb;
    }
    image::imageops::resize(&rgb, size, size, FilterType::Triangle)
}

/// Scales pixels to [0,1], applies the channel-wise training normalization
/// and lays the result out as an NCHW batch of one.
pub fn to_tensor(img: &RgbImage, normalization: &NormalizationSpec, device: Device) -> Tensor {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; 3 * plane];
    for (x, y, pixel) in img.enumerate_pixels() {
        let offset = (y * width + x) as usize;
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + offset] = (value - normalization.mean[c]) / normalization.std[c];
        }
    }
    Tensor::from_slice(&data)
        .view([1, 3, height as i64, width as i64])
        .to_device(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn checker(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 0, 64])
            } else {
                Rgb([0, 128, 255])
            }
        })
    }

    #[test]
    fn resize_of_already_sized_image_is_identity() {
        let img = checker(300, 300);
        let resized = resize_to_input(&DynamicImage::ImageRgb8(img.clone()), 300);
        assert_eq!(resized.as_raw(), img.as_raw());
    }

    #[test]
    fn resize_forces_exact_working_resolution() {
        let img = checker(640, 480);
        let resized = resize_to_input(&DynamicImage::ImageRgb8(img), 300);
        assert_eq!(resized.dimensions(), (300, 300));
    }

    #[test]
    fn corrupt_bytes_surface_a_decoding_error() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(InferenceError::Preprocessing(_))));
    }

    #[test]
    fn tensor_is_a_normalized_nchw_batch() {
        let normalization = NormalizationSpec {
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
        };
        let img = RgbImage::from_pixel(4, 4, Rgb([255, 0, 128]));
        let tensor = to_tensor(&img, &normalization, Device::Cpu);
        assert_eq!(tensor.size(), vec![1, 3, 4, 4]);
        // red channel: (1.0 - 0.5) / 0.5 = 1.0; green: -1.0
        assert!((tensor.double_value(&[0, 0, 0, 0]) - 1.0).abs() < 1e-6);
        assert!((tensor.double_value(&[0, 1, 0, 0]) + 1.0).abs() < 1e-6);
    }
}
