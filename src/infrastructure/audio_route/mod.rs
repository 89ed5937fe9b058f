//! Audio route adapters

mod cpal_route;
mod passthrough;

pub use cpal_route::CpalAudioRoute;
pub use passthrough::PassthroughAudioRoute;
