//! media-capture - serialized audio/video capture sessions
//!
//! This crate drives a capture session through its lifecycle (permissions,
//! audio route, device wiring, running, recording to a file, teardown) from
//! a single serialized worker, and reports progress through a notification
//! sink.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Capture values, lifecycle state machines, and errors
//! - **Application**: Port interfaces (traits) and the session controller
//! - **Infrastructure**: Adapter implementations (cpal, virtual backend,
//!   notification sinks, config storage)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
