pub mod aggregator;
pub mod classifier;

pub use aggregator::summarize;
pub use classifier::{Classification, classify, classify_with_tolerance};
