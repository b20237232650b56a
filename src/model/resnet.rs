use crate::error::ModelLoadError;
use crate::model::blocks::{LayerBlock, check_conv};

use burn::{
    nn::{
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
    },
    prelude::*,
};
use log::warn;

/// Stage table: (residual blocks, in channels, out channels, stride).
const STAGES: [(usize, usize, usize, usize); 4] = [
    (2, 64, 64, 1),
    (2, 64, 128, 2),
    (2, 128, 256, 2),
    (2, 256, 512, 2),
];

const FEATURES: usize = 512;

#[derive(Module, Debug)]
pub struct ResNet18<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B>,
    relu: Relu,
    maxpool: MaxPool2d,
    layer1: LayerBlock<B>,
    layer2: LayerBlock<B>,
    layer3: LayerBlock<B>,
    layer4: LayerBlock<B>,
    avgpool: AdaptiveAvgPool2d,
    fc: Linear<B>,
}

impl<B: Backend> ResNet18<B> {
    pub fn new(num_classes: usize, device: &Device<B>) -> Self {
        let conv1 = Conv2dConfig::new([3, 64], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let norm1 = BatchNormConfig::new(64).init(device);
        let relu = Relu::new();
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let [s1, s2, s3, s4] = STAGES;
        let layer1 = LayerBlock::new(s1.0, s1.1, s1.2, s1.3, device);
        let layer2 = LayerBlock::new(s2.0, s2.1, s2.2, s2.3, device);
        let layer3 = LayerBlock::new(s3.0, s3.1, s3.2, s3.3, device);
        let layer4 = LayerBlock::new(s4.0, s4.1, s4.2, s4.3, device);

        let avgpool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let fc = LinearConfig::new(FEATURES, num_classes).init(device);

        ResNet18 {
            conv1,
            norm1,
            relu,
            maxpool,
            layer1,
            layer2,
            layer3,
            layer4,
            avgpool,
            fc,
        }
    }

    /// Pure forward pass; parameters are only read, so concurrent calls on a
    /// shared instance are safe. On a non-autodiff backend the batch-norm
    /// layers use their stored running statistics.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(input);
        let x = self.norm1.forward(x);
        let x = self.relu.forward(x);
        let x = self.maxpool.forward(x);

        let x = self.layer1.forward(x);
        let x = self.layer2.forward(x);
        let x = self.layer3.forward(x);
        let x = self.layer4.forward(x);

        let x = self.avgpool.forward(x);
        let x = x.flatten::<2>(1, 3);
        self.fc.forward(x)
    }

    /// Applies a persisted parameter record. Non-head shapes must match the
    /// constructed architecture exactly; a classifier-head shape mismatch is
    /// the single tolerated deviation, in which case the persisted head is
    /// dropped and the freshly initialized one kept.
    pub fn load(self, mut record: ResNet18Record<B>) -> Result<Self, ModelLoadError> {
        self.validate(&record)?;

        let expected = self.fc.weight.val().dims();
        let persisted = record.fc.weight.val().dims();
        if persisted != expected {
            warn!(
                "classifier head shape mismatch (persisted {persisted:?}, constructed {expected:?}); keeping fresh head initialization"
            );
            record.fc = self.fc.clone().into_record();
        }

        Ok(self.load_record(record))
    }

    fn validate(&self, record: &ResNet18Record<B>) -> Result<(), ModelLoadError> {
        check_conv(&self.conv1, &record.conv1, "conv1")?;
        self.layer1.validate(&record.layer1, "layer1")?;
        self.layer2.validate(&record.layer2, "layer2")?;
        self.layer3.validate(&record.layer3, "layer3")?;
        self.layer4.validate(&record.layer4, "layer4")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type B = burn::backend::NdArray;

    #[test]
    fn forward_produces_five_finite_logits() {
        let device = Default::default();
        let model = ResNet18::<B>::new(5, &device);
        let logits = model.forward(Tensor::zeros([1, 3, 512, 512], &device));

        assert_eq!(logits.dims(), [1, 5]);
        let values = logits.to_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn matching_head_round_trips_unchanged() {
        let device = Default::default();
        let donor = ResNet18::<B>::new(5, &device);
        let donor_fc = donor.fc.weight.val().to_data();
        let donor_conv1 = donor.conv1.weight.val().to_data();

        let loaded = ResNet18::<B>::new(5, &device)
            .load(donor.into_record())
            .unwrap();

        assert_eq!(loaded.fc.weight.val().to_data(), donor_fc);
        assert_eq!(loaded.conv1.weight.val().to_data(), donor_conv1);
    }

    #[test]
    fn mismatched_head_keeps_fresh_initialization() {
        let device = Default::default();
        let donor = ResNet18::<B>::new(3, &device);
        let donor_conv1 = donor.conv1.weight.val().to_data();

        let model = ResNet18::<B>::new(5, &device);
        let fresh_fc = model.fc.weight.val().to_data();
        let loaded = model.load(donor.into_record()).unwrap();

        assert_eq!(loaded.fc.weight.val().dims(), [FEATURES, 5]);
        assert_eq!(loaded.fc.weight.val().to_data(), fresh_fc);
        // Everything below the head still comes from the persisted record.
        assert_eq!(loaded.conv1.weight.val().to_data(), donor_conv1);
    }

    #[test]
    fn structurally_different_record_fails_loudly() {
        let device = Default::default();
        let mut record = ResNet18::<B>::new(5, &device).into_record();
        record.conv1 = Conv2dConfig::new([3, 32], [7, 7])
            .with_bias(false)
            .init::<B>(&device)
            .into_record();

        let err = ResNet18::<B>::new(5, &device).load(record).unwrap_err();
        match err {
            ModelLoadError::Incompatible { layer, .. } => assert_eq!(layer, "conv1"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
