#![forbid(unsafe_code)]

mod aggregator;

pub use aggregator::{StatusAggregator, apply_pass};
