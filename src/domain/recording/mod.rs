//! Recording domain module

mod length;

pub use length::{RecordingLength, DEFAULT_LENGTH_SECS, MAX_LENGTH_SECS};
