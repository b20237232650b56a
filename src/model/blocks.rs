use crate::error::ModelLoadError;

use burn::{
    nn::{
        BatchNorm, BatchNormConfig, PaddingConfig2d, Relu,
        conv::{Conv2d, Conv2dConfig, Conv2dRecord},
    },
    prelude::*,
};

#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B>,
    conv2: Conv2d<B>,
    norm2: BatchNorm<B>,
    relu: Relu,
    downsample: Option<DownsampleBlock<B>>,
}

#[derive(Module, Debug)]
pub struct DownsampleBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B>,
}

impl<B: Backend> DownsampleBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, stride: usize, device: &Device<B>) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [1, 1])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(0, 0))
            .with_bias(false)
            .init(device);
        let norm = BatchNormConfig::new(out_channels).init(device);

        DownsampleBlock { conv, norm }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(input);
        self.norm.forward(x)
    }
}

impl<B: Backend> BasicBlock<B> {
    pub fn init(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        device: &Device<B>,
    ) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let norm1 = BatchNormConfig::new(out_channels).init(device);

        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_stride([1, 1])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let norm2 = BatchNormConfig::new(out_channels).init(device);

        let relu = Relu::new();

        let downsample = {
            if stride != 1 || in_channels != out_channels {
                Some(DownsampleBlock::new(
                    in_channels,
                    out_channels,
                    stride,
                    device,
                ))
            } else {
                None
            }
        };

        BasicBlock {
            conv1,
            norm1,
            conv2,
            norm2,
            relu,
            downsample,
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = input.clone();

        let x = self.conv1.forward(input);
        let x = self.norm1.forward(x);
        let x = self.relu.forward(x);
        let x = self.conv2.forward(x);
        let x = self.norm2.forward(x);

        // Skip connection
        let x = {
            match &self.downsample {
                Some(downsample) => x + downsample.forward(identity),
                None => x + identity,
            }
        };

        self.relu.forward(x)
    }

    fn validate(&self, record: &BasicBlockRecord<B>, name: &str) -> Result<(), ModelLoadError> {
        check_conv(&self.conv1, &record.conv1, &format!("{name}.conv1"))?;
        check_conv(&self.conv2, &record.conv2, &format!("{name}.conv2"))?;
        match (&self.downsample, &record.downsample) {
            (Some(downsample), Some(record)) => check_conv(
                &downsample.conv,
                &record.conv,
                &format!("{name}.downsample.conv"),
            ),
            (None, None) => Ok(()),
            (expected, actual) => Err(ModelLoadError::Incompatible {
                layer: format!("{name}.downsample"),
                expected: shortcut_kind(expected.is_some()).into(),
                actual: shortcut_kind(actual.is_some()).into(),
            }),
        }
    }
}

fn shortcut_kind(projected: bool) -> &'static str {
    if projected {
        "projection shortcut"
    } else {
        "identity shortcut"
    }
}

pub(crate) fn check_conv<B: Backend>(
    conv: &Conv2d<B>,
    record: &Conv2dRecord<B>,
    name: &str,
) -> Result<(), ModelLoadError> {
    let expected = conv.weight.val().dims();
    let actual = record.weight.val().dims();
    if expected != actual {
        return Err(ModelLoadError::Incompatible {
            layer: name.to_string(),
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        });
    }
    Ok(())
}

#[derive(Module, Debug)]
pub struct LayerBlock<B: Backend> {
    blocks: Vec<BasicBlock<B>>,
}

impl<B: Backend> LayerBlock<B> {
    pub fn new(
        num_blocks: usize,
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        device: &Device<B>,
    ) -> Self {
        let blocks = (0..num_blocks)
            .map(|b| {
                let stride = if b == 0 { stride } else { 1 };
                let in_channels = if b == 0 { in_channels } else { out_channels };
                BasicBlock::init(in_channels, out_channels, stride, device)
            })
            .collect();

        LayerBlock { blocks }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = input;

        for block in &self.blocks {
            x = block.forward(x);
        }

        x
    }

    pub fn validate(&self, record: &LayerBlockRecord<B>, name: &str) -> Result<(), ModelLoadError> {
        if self.blocks.len() != record.blocks.len() {
            return Err(ModelLoadError::Incompatible {
                layer: name.to_string(),
                expected: format!("{} blocks", self.blocks.len()),
                actual: format!("{} blocks", record.blocks.len()),
            });
        }
        for (b, (block, record)) in self.blocks.iter().zip(record.blocks.iter()).enumerate() {
            block.validate(record, &format!("{name}.{b}"))?;
        }
        Ok(())
    }
}
