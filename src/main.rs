//! media-capture CLI entry point

use std::process::ExitCode;

use clap::Parser;

use media_capture::cli::{
    app::load_merged_config,
    args::{Cli, Commands, RecordArgs},
    config_cmd::handle_config_command,
    init_logging, run_devices, run_record, Presenter, RecordOptions, EXIT_ERROR,
    EXIT_USAGE_ERROR,
};
use media_capture::domain::config::AppConfig;
use media_capture::domain::recording::RecordingLength;
use media_capture::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    let cli_config = match &cli.command {
        Commands::Record(args) => args.to_config(),
        _ => AppConfig::empty(),
    };
    let config = load_merged_config(cli_config).await;
    init_logging(cli.verbose, config.log_level.as_deref());

    match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Devices { virtual_devices } => run_devices(virtual_devices, &presenter).await,
        Commands::Record(args) => match record_options(&args, &config) {
            Ok(options) => run_record(options).await,
            Err(message) => {
                presenter.error(&message);
                ExitCode::from(EXIT_USAGE_ERROR)
            }
        },
    }
}

/// Resolve record options from the merged config.
/// Invalid explicit values are usage errors; invalid file values fall back
/// to defaults.
fn record_options(args: &RecordArgs, config: &AppConfig) -> Result<RecordOptions, String> {
    let duration = match config.duration.as_deref().map(str::parse::<RecordingLength>) {
        Some(Ok(duration)) => duration,
        Some(Err(e)) if args.duration.is_some() => return Err(format!("Invalid duration: {}", e)),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Invalid duration in config file; using default");
            RecordingLength::default()
        }
        None => RecordingLength::default(),
    };

    if let Some(name) = args.name.as_deref() {
        if name.trim().is_empty() {
            return Err("Invalid name: must not be empty".to_string());
        }
    }

    Ok(RecordOptions {
        mode: config.mode_or_default(),
        name: config.name_or_default().to_string(),
        duration,
        output_dir: config.output_dir_or_default(),
        video_position: config.video_position_or_default(),
        rotation: config.rotation_or_default(),
        camera_access: config.camera_access_or_default(),
        microphone_access: config.microphone_access_or_default(),
        notify: config.notify_or_default(),
        virtual_devices: args.virtual_devices,
    })
}
