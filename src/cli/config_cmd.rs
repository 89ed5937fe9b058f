//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::capture::{CaptureMode, DevicePosition, RotationAngle};
use crate::domain::config::{AccessPolicy, AppConfig};
use crate::domain::error::ConfigError;
use crate::domain::recording::RecordingLength;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;
    let value = value.trim();

    match key {
        "mode" => config.mode = Some(value.to_lowercase()),
        "name" => config.name = Some(value.to_string()),
        "output_dir" => config.output_dir = Some(value.to_string()),
        "duration" => config.duration = Some(value.to_string()),
        "video_position" => config.video_position = Some(value.to_lowercase()),
        "rotation" => config.rotation = Some(value.to_string()),
        "camera_access" => config.camera_access = Some(value.to_lowercase()),
        "microphone_access" => config.microphone_access = Some(value.to_lowercase()),
        "notify" => config.notify = Some(parse_bool(value).map_err(|_| bool_error(key))?),
        "log_level" => config.log_level = Some(value.to_string()),
        _ => unreachable!(), // Already validated
    }

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match config_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = config_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn config_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "mode" => config.mode.clone(),
        "name" => config.name.clone(),
        "output_dir" => config.output_dir.clone(),
        "duration" => config.duration.clone(),
        "video_position" => config.video_position.clone(),
        "rotation" => config.rotation.clone(),
        "camera_access" => config.camera_access.clone(),
        "microphone_access" => config.microphone_access.clone(),
        "notify" => config.notify.map(|b| b.to_string()),
        "log_level" => config.log_level.clone(),
        _ => None,
    }
}

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn bool_error(key: &str) -> ConfigError {
    invalid(key, "Value must be 'true' or 'false'")
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "mode" => {
            value.parse::<CaptureMode>().map_err(|e| invalid(key, e))?;
        }
        "duration" => {
            value
                .parse::<RecordingLength>()
                .map_err(|e| invalid(key, e))?;
        }
        "video_position" => {
            value
                .parse::<DevicePosition>()
                .map_err(|e| invalid(key, e))?;
        }
        "rotation" => {
            value.parse::<RotationAngle>().map_err(|e| invalid(key, e))?;
        }
        "camera_access" | "microphone_access" => {
            value.parse::<AccessPolicy>().map_err(|e| invalid(key, e))?;
        }
        "notify" => {
            parse_bool(value).map_err(|_| bool_error(key))?;
        }
        "name" => {
            let name = value.trim();
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(invalid(key, "Name must be non-empty without path separators"));
            }
        }
        "log_level" => {
            tracing_subscriber::EnvFilter::try_new(value).map_err(|e| invalid(key, e))?;
        }
        _ => {} // output_dir accepts any path
    }
    Ok(())
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
