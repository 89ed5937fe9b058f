//! Capture session controller
//!
//! Owns the session lifecycle. Every mutation of the session, its device
//! handles, its output and the recording state happens on a single worker
//! thread that drains a FIFO command queue. Output and session events are
//! queued onto the same worker before they touch any state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::thread;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{mpsc, oneshot, watch};

use crate::domain::capture::{
    CaptureMode, DevicePosition, InterruptionReason, MediaKind, RecordingLifecycle,
    RecordingState, RecordingTarget, SessionLifecycle, SessionState, StopRequest,
};
use crate::domain::error::CaptureError;

use super::ports::{
    AudioCategory, AudioMode, AudioRoute, AudioRouteOptions, AudioRouteRequest,
    AuthorizationStatus, CaptureBackend, CaptureSession, Clock, DeviceDiscovery, DeviceInput,
    FileOutput, NotificationSink, OrientationProvider, PermissionProvider, RecordingObserver,
    SessionObserver, StabilizationMode,
};

/// Callback receiving the result of `start_capture_session`
pub type CompletionHandler = Box<dyn FnOnce(Result<(), CaptureError>) + Send + 'static>;

const NOT_INITIALIZED: &str = "not initialized";
const ALREADY_RUNNING: &str = "already running";
const ALREADY_CONFIGURED: &str = "session already configured; tear it down first";

/// Static settings of a controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// What gets recorded
    pub mode: CaptureMode,
    /// Directory receiving recorded files
    pub output_dir: PathBuf,
    /// Which camera to use in video mode
    pub video_position: DevicePosition,
}

impl ControllerConfig {
    pub fn new(mode: CaptureMode, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            output_dir: output_dir.into(),
            video_position: DevicePosition::default(),
        }
    }
}

/// Collaborators the controller drives
#[derive(Clone)]
pub struct CaptureServices {
    pub backend: Arc<dyn CaptureBackend>,
    pub discovery: Arc<dyn DeviceDiscovery>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub audio_route: Arc<dyn AudioRoute>,
    pub orientation: Arc<dyn OrientationProvider>,
    pub clock: Arc<dyn Clock>,
}

/// Snapshot of the controller state, published after every command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerStatus {
    pub session: SessionState,
    pub recording: RecordingState,
}

enum Command {
    SetSink(Option<Weak<dyn NotificationSink>>),
    Configure {
        reply: oneshot::Sender<Result<(), CaptureError>>,
    },
    StartSession {
        on_complete: CompletionHandler,
    },
    StopSession,
    StartRecording {
        name: String,
        reply: oneshot::Sender<Result<PathBuf, CaptureError>>,
    },
    StopRecording,
    Teardown,
    Output(OutputEvent),
    Session(SessionEvent),
    Barrier(oneshot::Sender<()>),
    Shutdown,
}

/// Output events carry the take they belong to
enum OutputEvent {
    Started {
        take: u64,
        path: PathBuf,
    },
    Finished {
        take: u64,
        path: PathBuf,
        error: Option<String>,
    },
}

enum SessionEvent {
    RuntimeError(String),
    Interrupted(Option<InterruptionReason>),
    InterruptionEnded,
}

/// Turns callbacks arriving on foreign threads into queued commands
struct EventRelay {
    commands: mpsc::UnboundedSender<Command>,
}

impl EventRelay {
    fn forward(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Capture worker stopped; dropping event");
        }
    }
}

/// Relay handed to the output for a single take
struct TakeRelay {
    relay: Arc<EventRelay>,
    take: u64,
}

impl RecordingObserver for TakeRelay {
    fn did_start_recording(&self, path: &Path) {
        self.relay.forward(Command::Output(OutputEvent::Started {
            take: self.take,
            path: path.to_path_buf(),
        }));
    }

    fn did_finish_recording(&self, path: &Path, error: Option<String>) {
        self.relay.forward(Command::Output(OutputEvent::Finished {
            take: self.take,
            path: path.to_path_buf(),
            error,
        }));
    }
}

impl SessionObserver for EventRelay {
    fn runtime_error(&self, reason: String) {
        self.forward(Command::Session(SessionEvent::RuntimeError(reason)));
    }

    fn interrupted(&self, reason: Option<InterruptionReason>) {
        self.forward(Command::Session(SessionEvent::Interrupted(reason)));
    }

    fn interruption_ended(&self) {
        self.forward(Command::Session(SessionEvent::InterruptionEnded));
    }
}

fn worker_gone() -> CaptureError {
    CaptureError::Unknown("capture worker is not running".to_string())
}

/// Audio route requested before hardware configuration
fn route_request(mode: CaptureMode) -> AudioRouteRequest {
    AudioRouteRequest {
        category: match mode {
            CaptureMode::Video => AudioCategory::PlayAndRecord,
            CaptureMode::Audio => AudioCategory::Record,
        },
        mode: match mode {
            CaptureMode::Video => AudioMode::VideoRecording,
            CaptureMode::Audio => AudioMode::Default,
        },
        options: AudioRouteOptions {
            mix_with_others: false,
            default_to_speaker: true,
            allow_bluetooth: true,
        },
    }
}

/// Caller-facing handle of a capture session.
///
/// Operations whose result the caller needs (`setup_session`,
/// `start_recording`) are awaited; the rest are queued and report through
/// the completion handler or the notification sink.
pub struct SessionController {
    mode: CaptureMode,
    permissions: Arc<dyn PermissionProvider>,
    audio_route: Arc<dyn AudioRoute>,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ControllerStatus>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SessionController {
    /// Create a controller and start its worker thread
    pub fn new(config: ControllerConfig, services: CaptureServices) -> Result<Self, CaptureError> {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(ControllerStatus::default());

        let worker = SessionWorker {
            config: config.clone(),
            backend: services.backend,
            discovery: services.discovery,
            orientation: services.orientation,
            clock: services.clock,
            relay: Arc::new(EventRelay {
                commands: commands.clone(),
            }),
            status: status_tx,
            sink: None,
            lifecycle: SessionLifecycle::new(),
            recording: RecordingLifecycle::new(),
            session: None,
            video_input: None,
            audio_input: None,
            output: None,
            target: None,
            take: 0,
        };

        let handle = thread::Builder::new()
            .name("capture-session".to_string())
            .spawn(move || worker.run(receiver))
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn capture worker: {}", e)))?;

        Ok(Self {
            mode: config.mode,
            permissions: services.permissions,
            audio_route: services.audio_route,
            commands,
            status,
            worker: Some(handle),
        })
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Latest published state
    pub fn status(&self) -> ControllerStatus {
        *self.status.borrow()
    }

    pub fn session_state(&self) -> SessionState {
        self.status().session
    }

    pub fn recording_state(&self) -> RecordingState {
        self.status().recording
    }

    pub fn is_recording(&self) -> bool {
        self.recording_state().is_active()
    }

    /// Register the listener for notifications. Only a weak reference is
    /// kept; dropping the sink unregisters it.
    pub fn set_notification_sink<S: NotificationSink + 'static>(&self, sink: &Arc<S>) {
        let weak: Weak<S> = Arc::downgrade(sink);
        let weak: Weak<dyn NotificationSink> = weak;
        self.post(Command::SetSink(Some(weak)));
    }

    pub fn clear_notification_sink(&self) {
        self.post(Command::SetSink(None));
    }

    /// Acquire permissions, configure the audio route, then wire devices
    /// and the file output into a new session.
    ///
    /// A second call is rejected; after a failure the session must be torn
    /// down before retrying.
    pub async fn setup_session(&self) -> Result<(), CaptureError> {
        if self.session_state() != SessionState::Uninitialized {
            return Err(CaptureError::setup(ALREADY_CONFIGURED));
        }

        for &kind in self.mode.required_media() {
            self.ensure_access(kind).await?;
        }

        let request = route_request(self.mode);
        self.audio_route.configure(request).await.map_err(|e| {
            tracing::warn!(route = %request, error = %e, "Audio route configuration failed");
            CaptureError::SetupFailed(e.to_string())
        })?;

        self.request(|reply| Command::Configure { reply }).await?
    }

    /// Start the session. Non-blocking; `on_complete` runs on the worker.
    pub fn start_capture_session<F>(&self, on_complete: F)
    where
        F: FnOnce(Result<(), CaptureError>) + Send + 'static,
    {
        self.post(Command::StartSession {
            on_complete: Box::new(on_complete),
        });
    }

    /// Stop the session if it is running. Non-blocking.
    pub fn stop_capture_session(&self) {
        self.post(Command::StopSession);
    }

    /// Start recording to `{output_dir}/{name}-{unix_seconds}.{ext}`.
    ///
    /// Resolves once the output has been told to start; the start itself is
    /// confirmed later through `recording_did_start`.
    pub async fn start_recording(&self, name: &str) -> Result<PathBuf, CaptureError> {
        let name = name.to_string();
        self.request(|reply| Command::StartRecording { name, reply })
            .await?
    }

    /// Stop the current recording, if any. Non-blocking.
    pub fn stop_recording(&self) {
        self.post(Command::StopRecording);
    }

    /// Release the session and every handle. Non-blocking.
    pub fn teardown_session(&self) {
        self.post(Command::Teardown);
    }

    /// Wait until every previously queued command and event is applied
    pub async fn flush(&self) {
        if self.request(Command::Barrier).await.is_err() {
            tracing::debug!("Capture worker stopped before flush");
        }
    }

    async fn ensure_access(&self, kind: MediaKind) -> Result<(), CaptureError> {
        match self.permissions.status(kind) {
            AuthorizationStatus::Authorized => Ok(()),
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                tracing::warn!(%kind, "Capture permission previously refused");
                Err(CaptureError::PermissionDenied(kind))
            }
            AuthorizationStatus::NotDetermined => {
                if self.permissions.request_access(kind).await {
                    Ok(())
                } else {
                    tracing::warn!(%kind, "Capture permission refused");
                    Err(CaptureError::PermissionDenied(kind))
                }
            }
        }
    }

    fn post(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::error!("Capture worker is not running; command dropped");
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CaptureError> {
        let (reply, response) = oneshot::channel();
        self.commands.send(build(reply)).map_err(|_| worker_gone())?;
        response.await.map_err(|_| worker_gone())
    }
}

/// Dropping the controller tears the session down and waits for the
/// worker to drain the queue. On a multi-threaded tokio runtime the wait
/// goes through `block_in_place` so other tasks keep running.
impl Drop for SessionController {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        let Some(worker) = self.worker.take() else {
            return;
        };
        // A sink may drop the last handle from inside a callback
        if worker.thread().id() == thread::current().id() {
            return;
        }
        let join = move || {
            if worker.join().is_err() {
                tracing::error!("Capture worker panicked");
            }
        };
        match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(join),
            _ => join(),
        }
    }
}

/// State owned by the worker thread
struct SessionWorker {
    config: ControllerConfig,
    backend: Arc<dyn CaptureBackend>,
    discovery: Arc<dyn DeviceDiscovery>,
    orientation: Arc<dyn OrientationProvider>,
    clock: Arc<dyn Clock>,
    relay: Arc<EventRelay>,
    status: watch::Sender<ControllerStatus>,
    sink: Option<Weak<dyn NotificationSink>>,
    lifecycle: SessionLifecycle,
    recording: RecordingLifecycle,
    session: Option<Box<dyn CaptureSession>>,
    video_input: Option<DeviceInput>,
    audio_input: Option<DeviceInput>,
    output: Option<Arc<dyn FileOutput>>,
    /// Path of the in-flight recording; set iff a recording is active
    target: Option<PathBuf>,
    /// Counter of recordings handed to the output; events of older takes
    /// are stale
    take: u64,
}

impl SessionWorker {
    fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.blocking_recv() {
            if let Command::Shutdown = command {
                self.teardown();
                self.publish();
                break;
            }
            self.handle(command);
            self.publish();
        }
        tracing::debug!("Capture worker exiting");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetSink(sink) => self.sink = sink,
            Command::Configure { reply } => {
                let result = self.configure();
                self.publish();
                let _ = reply.send(result);
            }
            Command::StartSession { on_complete } => {
                let result = self.start_session();
                if let Err(CaptureError::SetupFailed(reason)) = &result {
                    if reason == NOT_INITIALIZED {
                        let error = CaptureError::setup(NOT_INITIALIZED);
                        self.notify(|sink| sink.recording_service_failed(&error));
                    }
                }
                self.publish();
                on_complete(result);
            }
            Command::StopSession => self.stop_session(),
            Command::StartRecording { name, reply } => {
                let result = self.start_recording(&name);
                let _ = reply.send(result);
            }
            Command::StopRecording => self.stop_recording(),
            Command::Teardown => self.teardown(),
            Command::Output(OutputEvent::Started { take, path }) => {
                if self.is_current_take(take, &path) {
                    self.on_recording_started(&path);
                }
            }
            Command::Output(OutputEvent::Finished { take, path, error }) => {
                if self.is_current_take(take, &path) {
                    self.on_recording_finished(&path, error);
                }
            }
            Command::Session(event) => self.on_session_event(event),
            Command::Barrier(reply) => {
                let _ = reply.send(());
            }
            Command::Shutdown => {}
        }
    }

    fn is_current_take(&self, take: u64, path: &Path) -> bool {
        if take == self.take && self.target.is_some() {
            return true;
        }
        tracing::debug!(
            take,
            current = self.take,
            path = %path.display(),
            "Ignoring output event of a finished recording"
        );
        false
    }

    fn publish(&self) {
        self.status.send_replace(ControllerStatus {
            session: self.lifecycle.state(),
            recording: self.recording.state(),
        });
    }

    /// Publish the current state, then hand the sink to `deliver`
    fn notify(&self, deliver: impl FnOnce(&dyn NotificationSink)) {
        self.publish();
        match self.sink.as_ref().and_then(|weak| weak.upgrade()) {
            Some(sink) => deliver(sink.as_ref()),
            None => tracing::debug!("No notification sink registered"),
        }
    }

    fn configure(&mut self) -> Result<(), CaptureError> {
        self.lifecycle
            .begin_setup()
            .map_err(|_| CaptureError::setup(ALREADY_CONFIGURED))?;
        self.publish();

        let mut session = self.backend.create_session();
        session.begin_configuration();

        match self.wire(session.as_mut()) {
            Ok(()) => {
                session.commit_configuration();
                let observer: Arc<dyn SessionObserver> = self.relay.clone();
                session.subscribe(observer);
                self.session = Some(session);
                if let Err(e) = self.lifecycle.commit_setup() {
                    tracing::error!(error = %e, "Session lifecycle out of sync");
                }
                tracing::info!(mode = %self.config.mode, "Capture session configured");
                Ok(())
            }
            Err(e) => {
                // Left uncommitted; teardown releases whatever was wired
                tracing::warn!(error = %e, "Capture session setup failed");
                self.session = Some(session);
                Err(e)
            }
        }
    }

    fn wire(&mut self, session: &mut dyn CaptureSession) -> Result<(), CaptureError> {
        let mode = self.config.mode;

        match mode
            .preferred_presets()
            .iter()
            .copied()
            .find(|preset| session.can_set_preset(*preset))
        {
            Some(preset) => {
                session.set_preset(preset);
                tracing::debug!(%preset, "Selected session preset");
            }
            None => tracing::warn!("No preferred preset supported; keeping session default"),
        }

        if mode.captures_video() {
            let input = self.add_input(session, MediaKind::Video, self.config.video_position)?;
            self.video_input = Some(input);
        }
        let input = self.add_input(session, MediaKind::Audio, DevicePosition::Unspecified)?;
        self.audio_input = Some(input);

        let output = self.backend.create_file_output();
        if !session.can_add_output(&output) {
            return Err(CaptureError::io("session rejected the file output"));
        }
        session.add_output(Arc::clone(&output));

        if mode.captures_video() {
            if let Some(connection) = output.video_connection() {
                if connection.supports_stabilization() {
                    connection.set_stabilization(StabilizationMode::Auto);
                }
            }
        }
        self.output = Some(output);
        Ok(())
    }

    fn add_input(
        &self,
        session: &mut dyn CaptureSession,
        kind: MediaKind,
        position: DevicePosition,
    ) -> Result<DeviceInput, CaptureError> {
        let device = self
            .discovery
            .find(kind, position)
            .ok_or(CaptureError::DeviceNotFound(kind))?;
        let input = DeviceInput::new(device);
        if !session.can_add_input(&input) {
            return Err(CaptureError::io(format!(
                "session rejected the {} input \"{}\"",
                kind,
                input.device().name
            )));
        }
        session.add_input(&input);
        tracing::debug!(%kind, device = %input.device().name, "Added capture input");
        Ok(input)
    }

    fn start_session(&mut self) -> Result<(), CaptureError> {
        let Some(session) = self.session.as_mut() else {
            return Err(CaptureError::setup(NOT_INITIALIZED));
        };
        match self.lifecycle.state() {
            SessionState::Running => Err(CaptureError::setup(ALREADY_RUNNING)),
            SessionState::Idle => {
                session.start_running();
                if let Err(e) = self.lifecycle.start() {
                    tracing::error!(error = %e, "Session lifecycle out of sync");
                }
                tracing::info!("Capture session started");
                Ok(())
            }
            _ => Err(CaptureError::setup(NOT_INITIALIZED)),
        }
    }

    fn stop_session(&mut self) {
        if !self.lifecycle.is_running() {
            tracing::debug!(state = %self.lifecycle.state(), "Session not running; ignoring stop");
            return;
        }
        self.force_stop_recording("capture session stopped");
        if let Some(session) = self.session.as_mut() {
            session.stop_running();
        }
        if let Err(e) = self.lifecycle.stop() {
            tracing::error!(error = %e, "Session lifecycle out of sync");
        }
        tracing::info!("Capture session stopped");
    }

    fn start_recording(&mut self, name: &str) -> Result<PathBuf, CaptureError> {
        if !self.lifecycle.is_running() {
            return Err(CaptureError::SessionNotRunning);
        }
        let output = self
            .output
            .clone()
            .ok_or_else(|| CaptureError::io("output not configured"))?;
        if self.recording.is_active() || output.is_recording() {
            return Err(CaptureError::RecordingInProgress);
        }

        let dir = &self.config.output_dir;
        let target = RecordingTarget::new(dir, name, self.clock.unix_timestamp(), self.config.mode)?;
        std::fs::create_dir_all(dir).map_err(|e| {
            CaptureError::FileSystemError(format!("cannot create {}: {}", dir.display(), e))
        })?;

        self.recording
            .begin(self.lifecycle.state())
            .map_err(|_| CaptureError::RecordingInProgress)?;
        let path = target.into_path();
        self.target = Some(path.clone());

        if self.config.mode.captures_video() {
            self.apply_rotation(output.as_ref());
        }

        self.take += 1;
        self.publish();
        let observer: Arc<dyn RecordingObserver> = Arc::new(TakeRelay {
            relay: Arc::clone(&self.relay),
            take: self.take,
        });
        output.start_recording(&path, observer);
        tracing::info!(path = %path.display(), "Recording requested");
        Ok(path)
    }

    /// Best effort; a missing or fixed connection is not an error
    fn apply_rotation(&self, output: &dyn FileOutput) {
        let angle = self.orientation.current_rotation();
        match output.video_connection() {
            Some(connection) if connection.supports_rotation(angle) => {
                connection.set_rotation(angle);
            }
            Some(_) => tracing::debug!(%angle, "Video connection cannot rotate"),
            None => tracing::debug!("No video connection to rotate"),
        }
    }

    fn stop_recording(&mut self) {
        let Some(output) = self.output.clone() else {
            tracing::debug!("No output; ignoring stop recording");
            return;
        };
        if !output.is_recording() {
            tracing::debug!("Output not recording; ignoring stop recording");
            return;
        }

        output.stop_recording();
        match self.recording.request_stop() {
            Ok(StopRequest::Applied) => tracing::info!("Recording stopping"),
            Ok(StopRequest::Deferred) => {
                tracing::debug!("Stop requested before start confirmation")
            }
            Err(e) => tracing::debug!(error = %e, "Output stopped outside a tracked recording"),
        }
    }

    /// Abort an active recording without waiting for the output
    fn force_stop_recording(&mut self, reason: &str) {
        if !self.recording.is_active() {
            return;
        }
        if let Some(output) = self.output.as_ref() {
            if output.is_recording() {
                output.stop_recording();
            }
        }
        if let Err(e) = self.recording.abort() {
            tracing::error!(error = %e, "Recording lifecycle out of sync");
        }
        let path = self.target.take();
        tracing::warn!(reason, "Recording force-stopped");

        let error = CaptureError::RecordingFailed(Some(reason.to_string()));
        self.notify(|sink| sink.recording_did_stop(path.as_deref(), Some(&error)));
    }

    fn on_recording_started(&mut self, path: &Path) {
        if self.recording.state() != RecordingState::Starting {
            tracing::debug!(path = %path.display(), "Ignoring stale start event");
            return;
        }
        if let Err(e) = self.recording.confirm_started() {
            tracing::error!(error = %e, "Recording lifecycle out of sync");
            return;
        }
        tracing::info!(path = %path.display(), "Recording started");
        self.notify(|sink| sink.recording_did_start());
    }

    fn on_recording_finished(&mut self, reported: &Path, error: Option<String>) {
        let Some(path) = self.target.take() else {
            tracing::debug!(path = %reported.display(), "Ignoring stale finish event");
            return;
        };
        if reported != path.as_path() {
            tracing::debug!(
                reported = %reported.display(),
                tracked = %path.display(),
                "Output reported a different path; keeping the tracked target"
            );
        }
        if self.recording.state() == RecordingState::Recording {
            // Output stopped on its own; pass through STOPPING
            if let Err(e) = self.recording.request_stop() {
                tracing::error!(error = %e, "Recording lifecycle out of sync");
            }
            self.publish();
        }
        if let Err(e) = self.recording.finish() {
            tracing::error!(error = %e, "Recording lifecycle out of sync");
        }

        let error = error.map(|e| CaptureError::RecordingFailed(Some(e)));
        match &error {
            Some(e) => tracing::warn!(path = %path.display(), error = %e, "Recording failed"),
            None => tracing::info!(path = %path.display(), "Recording finished"),
        }
        self.notify(|sink| sink.recording_did_stop(Some(path.as_path()), error.as_ref()));
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        if self.session.is_none() {
            tracing::debug!("Ignoring event for a released session");
            return;
        }
        match event {
            SessionEvent::RuntimeError(reason) => self.on_runtime_error(reason),
            SessionEvent::Interrupted(reason) => {
                tracing::warn!(reason = ?reason, "Capture session interrupted");
                self.notify(|sink| sink.recording_session_interrupted(reason.as_ref()));
            }
            SessionEvent::InterruptionEnded => {
                tracing::info!("Capture session interruption ended");
                self.notify(|sink| sink.recording_session_interruption_ended());
            }
        }
    }

    fn on_runtime_error(&mut self, reason: String) {
        tracing::warn!(%reason, "Capture session runtime error");
        if self.recording.is_active() {
            if let Err(e) = self.recording.abort() {
                tracing::error!(error = %e, "Recording lifecycle out of sync");
            }
            let path = self.target.take();
            let error = CaptureError::RecordingFailed(Some(reason));
            self.notify(|sink| sink.recording_did_stop(path.as_deref(), Some(&error)));
        } else {
            let error = CaptureError::Unknown(reason);
            self.notify(|sink| sink.recording_service_failed(&error));
        }
    }

    fn teardown(&mut self) {
        if self.lifecycle.state() == SessionState::Uninitialized && self.session.is_none() {
            tracing::debug!("Nothing to tear down");
            return;
        }
        if let Err(e) = self.lifecycle.begin_teardown() {
            tracing::error!(error = %e, "Session lifecycle out of sync");
        }
        self.publish();

        self.force_stop_recording("session torn down");

        if let Some(mut session) = self.session.take() {
            session.unsubscribe();
            if session.is_running() {
                session.stop_running();
            }
            session.begin_configuration();
            for input in [self.video_input.take(), self.audio_input.take()]
                .into_iter()
                .flatten()
            {
                session.remove_input(&input);
            }
            if let Some(output) = self.output.take() {
                session.remove_output(&output);
            }
            session.commit_configuration();
        }

        self.video_input = None;
        self.audio_input = None;
        self.output = None;
        self.target = None;
        self.recording = RecordingLifecycle::new();
        if let Err(e) = self.lifecycle.finish_teardown() {
            tracing::error!(error = %e, "Session lifecycle out of sync");
        }
        tracing::info!("Capture session torn down");
    }
}
