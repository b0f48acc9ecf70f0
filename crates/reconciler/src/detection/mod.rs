#![forbid(unsafe_code)]

mod detector;

pub use detector::{DefaultDetector, ViolationDetector};
