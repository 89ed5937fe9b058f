//! Notification sink adapters
//!
//! Sinks receive session and recording callbacks from the controller's
//! worker thread. `FanoutSink` combines several of them.

mod channel;
mod fanout;
mod notify_rust;
mod tracing_sink;

pub use channel::ChannelSink;
pub use fanout::FanoutSink;
pub use notify_rust::DesktopSink;
pub use tracing_sink::TracingSink;
