//! Configuration domain module

mod app_config;

pub use app_config::{
    default_output_dir, AccessPolicy, AppConfig, DEFAULT_LOG_LEVEL, DEFAULT_RECORDING_NAME,
};
