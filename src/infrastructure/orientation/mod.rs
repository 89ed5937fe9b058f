//! Orientation adapters

mod fixed;

pub use fixed::FixedOrientation;
