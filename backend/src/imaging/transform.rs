use image::{RgbImage, imageops::FilterType};
use ndarray::Array4;

/// Per-channel statistics of the ImageNet-pretrained backbone.
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decodes any format the `image` crate recognises and drops alpha.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, image::ImageError> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Bilinear resize to `size × size`, scale to `[0, 1]`, normalize each
/// channel, and lay out as `[1, 3, size, size]`.
pub fn to_input_tensor(image: &RgbImage, size: u32) -> Array4<f32> {
    let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
    let side = size as usize;

    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            let value = pixel[channel] as f32 / 255.0;
            tensor[[0, channel, y as usize, x as usize]] =
                (value - CHANNEL_MEAN[channel]) / CHANNEL_STD[channel];
        }
    }
    tensor
}
