use image::{ImageBuffer, Luma, Rgb, RgbImage, imageops::FilterType};
use ndarray::Array2;

/// Rescales a non-negative intensity map so its maximum becomes 1.0.
/// An all-zero map is returned unchanged rather than divided by zero.
pub fn normalize_intensity(mut map: Array2<f32>) -> Array2<f32> {
    let max = map.iter().fold(0.0f32, |acc, &v| acc.max(v));
    if max > 0.0 {
        map.mapv_inplace(|v| (v / max).clamp(0.0, 1.0));
    }
    map
}

// Piecewise-linear jet colormap (0 = blue, 0.5 = green, 1 = red).
pub fn jet_color(intensity: f32) -> Rgb<u8> {
    let t = intensity.clamp(0.0, 1.0);
    let r = (1.5 - (4.0 * t - 3.0).abs()).clamp(0.0, 1.0);
    let g = (1.5 - (4.0 * t - 2.0).abs()).clamp(0.0, 1.0);
    let b = (1.5 - (4.0 * t - 1.0).abs()).clamp(0.0, 1.0);
    Rgb([
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ])
}

/// Bilinear resize of an intensity map to the target dimensions.
pub fn resize_map(map: &Array2<f32>, width: u32, height: u32) -> Array2<f32> {
    let (map_h, map_w) = map.dim();
    if (map_w as u32, map_h as u32) == (width, height) {
        return map.clone();
    }
    let buffer = ImageBuffer::<Luma<f32>, Vec<f32>>::from_fn(map_w as u32, map_h as u32, |x, y| {
        Luma([map[[y as usize, x as usize]]])
    });
    let resized = image::imageops::resize(&buffer, width, height, FilterType::Triangle);
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        resized.get_pixel(x as u32, y as u32)[0]
    })
}

/// Scales the map to [0,255], false-colors it and alpha-blends it over the
/// original image.
pub fn overlay_heatmap(
    original: &RgbImage,
    map: &Array2<f32>,
    heatmap_weight: f32,
    image_weight: f32,
) -> RgbImage {
    let (width, height) = original.dimensions();
    let map = resize_map(map, width, height);
    RgbImage::from_fn(width, height, |x, y| {
        let heat = jet_color(map[[y as usize, x as usize]]);
        let base = original.get_pixel(x, y);
        let mut blended = [0u8; 3];
        for c in 0..3 {
            let value = heatmap_weight * heat[c] as f32 + image_weight * base[c] as f32;
            blended[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(blended)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn normalization_rescales_maximum_to_one() {
        let map = normalize_intensity(array![[0.0, 1.5], [3.0, 0.75]]);
        assert!((map[[1, 0]] - 1.0).abs() < 1e-6);
        assert!((map[[0, 1]] - 0.5).abs() < 1e-6);
        assert!(map.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn all_zero_map_stays_all_zero() {
        let map = normalize_intensity(Array2::zeros((8, 8)));
        assert!(map.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn jet_endpoints_are_blue_green_red() {
        let cold = jet_color(0.0);
        assert!(cold[2] > cold[0] && cold[2] > cold[1]);
        let mid = jet_color(0.5);
        assert!(mid[1] > mid[0] && mid[1] > mid[2]);
        let hot = jet_color(1.0);
        assert!(hot[0] > hot[1] && hot[0] > hot[2]);
        // out-of-range input clamps instead of wrapping
        assert_eq!(jet_color(2.0), jet_color(1.0));
    }

    #[test]
    fn resize_is_identity_for_matching_dimensions() {
        let map = array![[0.1, 0.9], [0.4, 0.6]];
        let resized = resize_map(&map, 2, 2);
        assert_eq!(resized, map);
    }

    #[test]
    fn resize_reaches_target_dimensions() {
        let resized = resize_map(&Array2::from_elem((10, 10), 0.5), 300, 300);
        assert_eq!(resized.dim(), (300, 300));
        assert!(resized.iter().all(|v| (*v - 0.5).abs() < 1e-4));
    }

    #[test]
    fn overlay_blends_with_the_given_weights() {
        let original = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let map = Array2::from_elem((2, 2), 1.0);
        let blended = overlay_heatmap(&original, &map, 0.4, 0.6);
        let hot = jet_color(1.0);
        let expected = (0.4 * hot[0] as f32).round() as u8;
        assert_eq!(blended.get_pixel(0, 0)[0], expected);
        assert_eq!(blended.get_pixel(0, 0)[1], 0);
        assert_eq!(blended.get_pixel(0, 0)[2], 0);
    }
}
