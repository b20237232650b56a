pub mod blocks;
pub mod inference;
pub mod loader;
pub mod resnet;
