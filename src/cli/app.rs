//! Runners for the record and devices commands

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};

use crate::application::ports::{
    AudioRoute, ConfigStore, DeviceDiscovery, PermissionProvider, SessionNotification,
};
use crate::application::{CaptureServices, ControllerConfig, SessionController};
use crate::domain::capture::MediaKind;
use crate::domain::config::AppConfig;
use crate::domain::error::CaptureError;
use crate::infrastructure::{
    ChannelSink, CpalAudioRoute, CpalDeviceDiscovery, DesktopSink, FanoutSink, FixedOrientation,
    PassthroughAudioRoute, PolicyPermissions, SystemClock, TracingSink, VirtualCaptureBackend,
    VirtualDeviceDiscovery, XdgConfigStore,
};

use super::args::RecordOptions;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// How long to wait for the output to confirm a start or stop
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(10);
const PROGRESS_TICK: Duration = Duration::from_millis(200);

type Notifications = mpsc::UnboundedReceiver<SessionNotification>;

/// Record one clip and print its path on stdout
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    shutdown.setup();

    match record(&options, &mut presenter, &shutdown).await {
        Ok(path) => {
            presenter.output(&path.display().to_string());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail("Recording failed");
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// List capture devices on stdout
pub async fn run_devices(virtual_devices: bool, presenter: &Presenter) -> ExitCode {
    let discovery = discovery(virtual_devices);

    // cpal enumeration blocks
    let devices = tokio::task::spawn_blocking(move || {
        let mut devices = discovery.list(MediaKind::Audio);
        devices.extend(discovery.list(MediaKind::Video));
        devices
    })
    .await;

    match devices {
        Ok(devices) if devices.is_empty() => {
            presenter.warn("No capture devices found");
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(devices) => {
            devices.iter().for_each(|d| presenter.device(d));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&format!("Device enumeration failed: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Load and merge configuration from defaults, file, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    AppConfig::defaults().merge(file_config).merge(cli_config)
}

fn discovery(virtual_devices: bool) -> Arc<dyn DeviceDiscovery> {
    if virtual_devices {
        Arc::new(VirtualDeviceDiscovery::new())
    } else {
        Arc::new(CpalDeviceDiscovery::with_video_fallback(
            VirtualDeviceDiscovery::new(),
        ))
    }
}

fn build_services(options: &RecordOptions) -> CaptureServices {
    let audio_route: Arc<dyn AudioRoute> = if options.virtual_devices {
        Arc::new(PassthroughAudioRoute::new())
    } else {
        Arc::new(CpalAudioRoute::new())
    };
    let permissions: Arc<dyn PermissionProvider> = Arc::new(PolicyPermissions::new(
        options.camera_access,
        options.microphone_access,
    ));

    CaptureServices {
        backend: Arc::new(VirtualCaptureBackend::new()),
        discovery: discovery(options.virtual_devices),
        permissions,
        audio_route,
        orientation: Arc::new(FixedOrientation::new(options.rotation)),
        clock: Arc::new(SystemClock::new()),
    }
}

async fn record(
    options: &RecordOptions,
    presenter: &mut Presenter,
    shutdown: &ShutdownSignal,
) -> Result<PathBuf, CaptureError> {
    let config = ControllerConfig {
        mode: options.mode,
        output_dir: options.output_dir.clone(),
        video_position: options.video_position,
    };
    let controller = SessionController::new(config, build_services(options))?;

    let (channel, mut notifications) = ChannelSink::new();
    let mut sink = FanoutSink::new().with(TracingSink::new()).with(channel);
    if options.notify {
        sink = sink.with(DesktopSink::new());
    }
    let sink = Arc::new(sink);
    controller.set_notification_sink(&sink);

    let result = capture(&controller, options, presenter, shutdown, &mut notifications).await;

    controller.teardown_session();
    controller.flush().await;
    result
}

async fn capture(
    controller: &SessionController,
    options: &RecordOptions,
    presenter: &mut Presenter,
    shutdown: &ShutdownSignal,
    notifications: &mut Notifications,
) -> Result<PathBuf, CaptureError> {
    presenter.start_spinner(&format!("Setting up {} capture...", options.mode));
    controller.setup_session().await?;

    let (done, started) = oneshot::channel();
    controller.start_capture_session(move |result| {
        let _ = done.send(result);
    });
    started
        .await
        .map_err(|_| CaptureError::Unknown("capture worker stopped".to_string()))??;

    let path = controller.start_recording(&options.name).await?;
    presenter.update_spinner("Waiting for the recording to start...");
    wait_for_start(notifications, presenter).await?;

    let total = options.duration.as_std();
    let started_at = Instant::now();
    let mut ticker = tokio::time::interval(PROGRESS_TICK);
    let deadline = tokio::time::sleep(total);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = shutdown.wait() => {
                presenter.info("Interrupted, stopping recording");
                break;
            }
            _ = ticker.tick() => {
                let elapsed = started_at.elapsed().as_millis() as u64;
                presenter.update_recording_progress(elapsed, total.as_millis() as u64);
            }
            notification = notifications.recv() => {
                match notification {
                    Some(SessionNotification::RecordingStopped { error: Some(error), .. }) => {
                        return Err(error);
                    }
                    Some(SessionNotification::RecordingStopped { url, error: None }) => {
                        // Output ended the take on its own
                        return Ok(url.unwrap_or(path));
                    }
                    Some(other) => report(&other, presenter)?,
                    None => {
                        return Err(CaptureError::Unknown(
                            "notification channel closed".to_string(),
                        ))
                    }
                }
            }
        }
    }

    presenter.update_spinner("Finishing recording...");
    controller.stop_recording();
    let saved = wait_for_stop(notifications, presenter).await?;
    presenter.spinner_success("Recording saved");
    Ok(saved.unwrap_or(path))
}

/// Surface a notification that does not end the take
fn report(notification: &SessionNotification, presenter: &Presenter) -> Result<(), CaptureError> {
    match notification {
        SessionNotification::Interrupted(reason) => {
            let reason = reason
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown reason".to_string());
            presenter.warn(&format!("Capture interrupted: {}", reason));
            Ok(())
        }
        SessionNotification::InterruptionEnded => {
            presenter.info("Capture resumed");
            Ok(())
        }
        SessionNotification::ServiceFailed(error) => Err(error.clone()),
        SessionNotification::RecordingStarted => Ok(()),
        SessionNotification::RecordingStopped { error: Some(error), .. } => Err(error.clone()),
        SessionNotification::RecordingStopped { error: None, .. } => Ok(()),
    }
}

async fn next(
    notifications: &mut Notifications,
    waiting_for: &str,
) -> Result<SessionNotification, CaptureError> {
    match tokio::time::timeout(CONFIRM_TIMEOUT, notifications.recv()).await {
        Ok(Some(notification)) => Ok(notification),
        Ok(None) => Err(CaptureError::Unknown("notification channel closed".to_string())),
        Err(_) => Err(CaptureError::Unknown(format!(
            "timed out waiting for {}",
            waiting_for
        ))),
    }
}

async fn wait_for_start(
    notifications: &mut Notifications,
    presenter: &mut Presenter,
) -> Result<(), CaptureError> {
    loop {
        match next(notifications, "the recording to start").await? {
            SessionNotification::RecordingStarted => {
                presenter.update_spinner("Recording...");
                return Ok(());
            }
            SessionNotification::RecordingStopped { error, .. } => {
                return Err(error.unwrap_or_else(|| CaptureError::recording(None::<String>)));
            }
            other => report(&other, presenter)?,
        }
    }
}

async fn wait_for_stop(
    notifications: &mut Notifications,
    presenter: &Presenter,
) -> Result<Option<PathBuf>, CaptureError> {
    loop {
        match next(notifications, "the recording to stop").await? {
            SessionNotification::RecordingStopped { error: Some(error), .. } => return Err(error),
            SessionNotification::RecordingStopped { url, error: None } => return Ok(url),
            other => report(&other, presenter)?,
        }
    }
}
