use crate::common::{CHANNELS, HEIGHT, WIDTH};
use crate::data::normalize::{NormalizeConfig, normalize};
use crate::error::PredictionError;

use burn::{prelude::*, tensor::Tensor};
use image::{RgbImage, imageops::FilterType};

/// Decodes raw image bytes and produces a standardized `[3, 512, 512]` tensor
/// ready for the backbone. Aspect ratio is ignored: the image is stretched to
/// the target resolution with bilinear interpolation.
pub fn decode_and_preprocess<B: Backend>(
    bytes: &[u8],
    device: &B::Device,
) -> Result<Tensor<B, 3>, PredictionError> {
    // Quantize to 8-bit RGB first, then resize; interpolation must happen on
    // the same representation the training pipeline used.
    let decoded = image::load_from_memory(bytes)?.into_rgb8();
    let resized = image::imageops::resize(
        &decoded,
        WIDTH as u32,
        HEIGHT as u32,
        FilterType::Triangle,
    );
    let tensor = convert_image_to_tensor::<B>(&resized, device);
    Ok(normalize(tensor, &NormalizeConfig::default()))
}

pub fn convert_image_to_tensor<B: Backend>(img: &RgbImage, device: &B::Device) -> Tensor<B, 3> {
    assert_eq!(
        img.width() as usize,
        WIDTH,
        "Unexpected width: {} != {}",
        img.width(),
        WIDTH
    );
    assert_eq!(
        img.height() as usize,
        HEIGHT,
        "Unexpected height: {} != {}",
        img.height(),
        HEIGHT
    );

    let hw = HEIGHT * WIDTH;
    let mut buf = vec![0f32; CHANNELS * hw];
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let p = img.get_pixel(x as u32, y as u32).0;
            let idx = y * WIDTH + x;
            buf[idx] = p[0] as f32 / 255.0;
            buf[hw + idx] = p[1] as f32 / 255.0;
            buf[2 * hw + idx] = p[2] as f32 / 255.0;
        }
    }
    Tensor::<B, 3>::from_data(
        TensorData::new(buf, [CHANNELS, HEIGHT, WIDTH]).convert::<B::FloatElem>(),
        device,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    type B = burn::backend::NdArray;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn output_shape_is_fixed_regardless_of_input_resolution() {
        let device = Default::default();
        for (w, h) in [(64, 64), (317, 89), (1000, 800)] {
            let tensor = decode_and_preprocess::<B>(&encode_png(w, h), &device).unwrap();
            assert_eq!(tensor.dims(), [CHANNELS, HEIGHT, WIDTH]);
        }
    }

    #[test]
    fn output_values_stay_in_standardized_range() {
        let device = Default::default();
        let tensor = decode_and_preprocess::<B>(&encode_png(100, 60), &device).unwrap();
        let values = tensor.to_data().to_vec::<f32>().unwrap();
        // [0,1] pixels standardized with the ImageNet constants land in (-3, 3).
        assert!(values.iter().all(|v| v.is_finite() && v.abs() < 3.0));
    }

    #[test]
    fn sixteen_bit_png_is_quantized_before_interpolation() {
        let device = Default::default();

        // 16-bit values chosen as exact 257-multiples so the 8-bit
        // quantization is unambiguous in either rounding convention.
        let shade = |x: u32, y: u32| {
            [
                ((x * 7 + y * 3) % 256) as u16,
                ((x * 5 + y * 11) % 256) as u16,
                ((x + y * 13) % 256) as u16,
            ]
        };
        let deep = image::ImageBuffer::<image::Rgb<u16>, Vec<u16>>::from_fn(37, 23, |x, y| {
            let [r, g, b] = shade(x, y);
            image::Rgb([r * 257, g * 257, b * 257])
        });
        let narrow = RgbImage::from_fn(37, 23, |x, y| {
            let [r, g, b] = shade(x, y);
            image::Rgb([r as u8, g as u8, b as u8])
        });

        let mut deep_png = Vec::new();
        deep.write_to(&mut Cursor::new(&mut deep_png), image::ImageFormat::Png)
            .unwrap();
        let mut narrow_png = Vec::new();
        narrow
            .write_to(&mut Cursor::new(&mut narrow_png), image::ImageFormat::Png)
            .unwrap();

        let from_deep = decode_and_preprocess::<B>(&deep_png, &device).unwrap();
        let from_narrow = decode_and_preprocess::<B>(&narrow_png, &device).unwrap();
        assert_eq!(from_deep.to_data(), from_narrow.to_data());
    }

    #[test]
    fn rejects_non_image_bytes() {
        let device = Default::default();
        let err = decode_and_preprocess::<B>(b"definitely not an image", &device).unwrap_err();
        assert!(matches!(err, PredictionError::Decode(_)));
    }

    #[test]
    fn rejects_empty_payload() {
        let device = Default::default();
        let err = decode_and_preprocess::<B>(&[], &device).unwrap_err();
        assert!(matches!(err, PredictionError::Decode(_)));
    }
}
