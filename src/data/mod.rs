pub mod normalize;
pub mod preprocess;

pub use preprocess::decode_and_preprocess;
