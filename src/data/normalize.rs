use burn::{prelude::*, tensor::Tensor};

pub struct NormalizeConfig {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        // ImageNet statistics; the backbone's early layers assume this range.
        NormalizeConfig {
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

pub fn normalize<B: Backend>(tensor: Tensor<B, 3>, config: &NormalizeConfig) -> Tensor<B, 3> {
    let mean = Tensor::from_data(
        TensorData::new(config.mean.to_vec(), [3, 1, 1]).convert::<B::FloatElem>(),
        &tensor.device(),
    );
    let std = Tensor::from_data(
        TensorData::new(config.std.to_vec(), [3, 1, 1]).convert::<B::FloatElem>(),
        &tensor.device(),
    );

    (tensor - mean) / std
}

#[cfg(test)]
mod tests {
    use super::*;

    type B = burn::backend::NdArray;

    #[test]
    fn standardizes_each_channel_independently() {
        let device = Default::default();
        let ones = Tensor::<B, 3>::ones([3, 2, 2], &device);
        let config = NormalizeConfig::default();
        let out = normalize(ones, &config)
            .to_data()
            .to_vec::<f32>()
            .unwrap();

        for (c, chunk) in out.chunks(4).enumerate() {
            let expected = (1.0 - config.mean[c]) / config.std[c];
            for v in chunk {
                assert!((v - expected).abs() < 1e-5, "channel {c}: {v} != {expected}");
            }
        }
    }
}
