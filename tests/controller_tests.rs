//! Session controller behaviour tests
//!
//! Every port is replaced by a fake that records what the controller did.
//! Fake outputs and sessions call their observers inline; `settle` flushes
//! the controller queue so those events are applied before asserting.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};

use media_capture::application::ports::{
    AudioCategory, AudioMode, AudioRoute, AudioRouteError, AudioRouteRequest, AuthorizationStatus,
    CaptureBackend, CaptureDevice, CaptureSession, Clock, DeviceDiscovery, DeviceInput,
    FileOutput, OrientationProvider, PermissionProvider, RecordingObserver, SessionNotification,
    SessionObserver, StabilizationMode, VideoConnection,
};
use media_capture::application::{
    CaptureServices, ControllerConfig, ControllerStatus, SessionController,
};
use media_capture::domain::capture::{
    CaptureMode, DevicePosition, InterruptionReason, MediaKind, RecordingState, RotationAngle,
    SessionPreset, SessionState,
};
use media_capture::domain::error::CaptureError;
use media_capture::infrastructure::ChannelSink;

type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeConnection {
    rotatable: bool,
    stabilization: Mutex<Option<StabilizationMode>>,
    rotation: Mutex<Option<RotationAngle>>,
}

impl VideoConnection for FakeConnection {
    fn supports_stabilization(&self) -> bool {
        true
    }

    fn set_stabilization(&self, mode: StabilizationMode) {
        *self.stabilization.lock().unwrap() = Some(mode);
    }

    fn supports_rotation(&self, _angle: RotationAngle) -> bool {
        self.rotatable
    }

    fn set_rotation(&self, angle: RotationAngle) {
        *self.rotation.lock().unwrap() = Some(angle);
    }
}

struct FakeOutput {
    journal: Journal,
    auto_start: bool,
    auto_finish: bool,
    recording: AtomicBool,
    starts: AtomicUsize,
    current: Mutex<Option<(PathBuf, Arc<dyn RecordingObserver>)>>,
    connection: Arc<FakeConnection>,
}

impl FakeOutput {
    fn emit_started(&self) {
        let (path, observer) = self.current.lock().unwrap().clone().unwrap();
        observer.did_start_recording(&path);
    }

    fn emit_finished_at(&self, path: Option<&Path>, error: Option<&str>) {
        let current = self.current.lock().unwrap().take();
        if let Some((recorded, observer)) = current {
            self.recording.store(false, Ordering::SeqCst);
            let path = path.map(Path::to_path_buf).unwrap_or(recorded);
            observer.did_finish_recording(&path, error.map(str::to_string));
        }
    }

    fn emit_finished(&self, error: Option<&str>) {
        self.emit_finished_at(None, error);
    }

    /// Forget the current take without reporting it, keeping its observer
    fn detach(&self) -> (PathBuf, Arc<dyn RecordingObserver>) {
        self.recording.store(false, Ordering::SeqCst);
        self.current.lock().unwrap().take().unwrap()
    }
}

impl FileOutput for FakeOutput {
    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    fn video_connection(&self) -> Option<Arc<dyn VideoConnection>> {
        let connection: Arc<dyn VideoConnection> = self.connection.clone();
        Some(connection)
    }

    fn start_recording(&self, path: &Path, observer: Arc<dyn RecordingObserver>) {
        record(&self.journal, "output.start");
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.recording.store(true, Ordering::SeqCst);
        *self.current.lock().unwrap() = Some((path.to_path_buf(), Arc::clone(&observer)));
        if self.auto_start {
            observer.did_start_recording(path);
        }
    }

    fn stop_recording(&self) {
        record(&self.journal, "output.stop");
        if self.auto_finish {
            self.emit_finished(None);
        }
    }
}

struct SessionShared {
    journal: Journal,
    presets: Vec<SessionPreset>,
    accept_inputs: bool,
    accept_output: bool,
    running: AtomicBool,
    observer: Mutex<Option<Arc<dyn SessionObserver>>>,
    created: AtomicUsize,
}

impl SessionShared {
    fn observer(&self) -> Arc<dyn SessionObserver> {
        self.observer.lock().unwrap().clone().unwrap()
    }
}

struct FakeSession(Arc<SessionShared>);

impl CaptureSession for FakeSession {
    fn begin_configuration(&mut self) {
        record(&self.0.journal, "begin");
    }

    fn commit_configuration(&mut self) {
        record(&self.0.journal, "commit");
    }

    fn can_set_preset(&self, preset: SessionPreset) -> bool {
        self.0.presets.contains(&preset)
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        record(&self.0.journal, format!("preset:{}", preset));
    }

    fn can_add_input(&self, _input: &DeviceInput) -> bool {
        self.0.accept_inputs
    }

    fn add_input(&mut self, input: &DeviceInput) {
        record(&self.0.journal, format!("add_input:{}", input.kind()));
    }

    fn remove_input(&mut self, input: &DeviceInput) {
        record(&self.0.journal, format!("remove_input:{}", input.kind()));
    }

    fn can_add_output(&self, _output: &Arc<dyn FileOutput>) -> bool {
        self.0.accept_output
    }

    fn add_output(&mut self, _output: Arc<dyn FileOutput>) {
        record(&self.0.journal, "add_output");
    }

    fn remove_output(&mut self, _output: &Arc<dyn FileOutput>) {
        record(&self.0.journal, "remove_output");
    }

    fn start_running(&mut self) {
        record(&self.0.journal, "start");
        self.0.running.store(true, Ordering::SeqCst);
    }

    fn stop_running(&mut self) {
        record(&self.0.journal, "stop");
        self.0.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.0.running.load(Ordering::SeqCst)
    }

    fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) {
        record(&self.0.journal, "subscribe");
        *self.0.observer.lock().unwrap() = Some(observer);
    }

    fn unsubscribe(&mut self) {
        record(&self.0.journal, "unsubscribe");
        *self.0.observer.lock().unwrap() = None;
    }
}

struct FakeBackend {
    shared: Arc<SessionShared>,
    output: Arc<FakeOutput>,
}

impl CaptureBackend for FakeBackend {
    fn create_session(&self) -> Box<dyn CaptureSession> {
        self.shared.created.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeSession(Arc::clone(&self.shared)))
    }

    fn create_file_output(&self) -> Arc<dyn FileOutput> {
        self.output.clone()
    }
}

struct FakeDiscovery {
    devices: Vec<CaptureDevice>,
}

impl DeviceDiscovery for FakeDiscovery {
    fn find(&self, kind: MediaKind, position: DevicePosition) -> Option<CaptureDevice> {
        self.devices
            .iter()
            .find(|d| {
                d.kind == kind
                    && (position == DevicePosition::Unspecified || d.position == position)
            })
            .cloned()
    }

    fn list(&self, kind: MediaKind) -> Vec<CaptureDevice> {
        self.devices.iter().filter(|d| d.kind == kind).cloned().collect()
    }
}

struct FakePermissions {
    audio: AuthorizationStatus,
    video: AuthorizationStatus,
    grant_on_request: bool,
    requests: Mutex<Vec<MediaKind>>,
}

#[async_trait]
impl PermissionProvider for FakePermissions {
    fn status(&self, kind: MediaKind) -> AuthorizationStatus {
        match kind {
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
        }
    }

    async fn request_access(&self, kind: MediaKind) -> bool {
        self.requests.lock().unwrap().push(kind);
        self.grant_on_request
    }
}

struct FakeAudioRoute {
    failure: Option<&'static str>,
    requests: Mutex<Vec<AudioRouteRequest>>,
}

#[async_trait]
impl AudioRoute for FakeAudioRoute {
    async fn configure(&self, request: AudioRouteRequest) -> Result<(), AudioRouteError> {
        self.requests.lock().unwrap().push(request);
        match self.failure {
            Some(reason) => Err(AudioRouteError(reason.to_string())),
            None => Ok(()),
        }
    }
}

struct FixedClock(i64);

impl Clock for FixedClock {
    fn unix_timestamp(&self) -> i64 {
        self.0
    }
}

struct FixedRotation(RotationAngle);

impl OrientationProvider for FixedRotation {
    fn current_rotation(&self) -> RotationAngle {
        self.0
    }
}

fn device(id: &str, kind: MediaKind, position: DevicePosition) -> CaptureDevice {
    CaptureDevice {
        id: id.to_string(),
        name: id.to_string(),
        kind,
        position,
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Setup {
    mode: CaptureMode,
    audio: AuthorizationStatus,
    video: AuthorizationStatus,
    grant_on_request: bool,
    route_failure: Option<&'static str>,
    has_video_device: bool,
    presets: Vec<SessionPreset>,
    accept_inputs: bool,
    accept_output: bool,
    auto_start: bool,
    auto_finish: bool,
    rotatable: bool,
}

impl Setup {
    fn new(mode: CaptureMode) -> Self {
        Self {
            mode,
            audio: AuthorizationStatus::Authorized,
            video: AuthorizationStatus::Authorized,
            grant_on_request: true,
            route_failure: None,
            has_video_device: true,
            presets: vec![SessionPreset::Hd1920x1080, SessionPreset::High],
            accept_inputs: true,
            accept_output: true,
            auto_start: true,
            auto_finish: true,
            rotatable: true,
        }
    }

    fn build(self) -> Harness {
        let dir = TempDir::new().unwrap();
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));

        let output = Arc::new(FakeOutput {
            journal: Arc::clone(&journal),
            auto_start: self.auto_start,
            auto_finish: self.auto_finish,
            recording: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            current: Mutex::new(None),
            connection: Arc::new(FakeConnection {
                rotatable: self.rotatable,
                stabilization: Mutex::new(None),
                rotation: Mutex::new(None),
            }),
        });
        let shared = Arc::new(SessionShared {
            journal: Arc::clone(&journal),
            presets: self.presets,
            accept_inputs: self.accept_inputs,
            accept_output: self.accept_output,
            running: AtomicBool::new(false),
            observer: Mutex::new(None),
            created: AtomicUsize::new(0),
        });

        let mut devices = vec![device("mic", MediaKind::Audio, DevicePosition::Unspecified)];
        if self.has_video_device {
            devices.push(device("front", MediaKind::Video, DevicePosition::Front));
            devices.push(device("back", MediaKind::Video, DevicePosition::Back));
        }

        let permissions = Arc::new(FakePermissions {
            audio: self.audio,
            video: self.video,
            grant_on_request: self.grant_on_request,
            requests: Mutex::new(Vec::new()),
        });
        let route = Arc::new(FakeAudioRoute {
            failure: self.route_failure,
            requests: Mutex::new(Vec::new()),
        });

        let services = CaptureServices {
            backend: Arc::new(FakeBackend {
                shared: Arc::clone(&shared),
                output: Arc::clone(&output),
            }),
            discovery: Arc::new(FakeDiscovery { devices }),
            permissions: permissions.clone(),
            audio_route: route.clone(),
            orientation: Arc::new(FixedRotation(RotationAngle::Deg90)),
            clock: Arc::new(FixedClock(1000)),
        };

        let output_dir = dir.path().join("clips");
        let controller =
            SessionController::new(ControllerConfig::new(self.mode, &output_dir), services)
                .unwrap();

        let (sink, notifications) = ChannelSink::new();
        let sink = Arc::new(sink);
        controller.set_notification_sink(&sink);

        Harness {
            controller,
            journal,
            output,
            shared,
            permissions,
            route,
            sink,
            notifications,
            output_dir,
            _dir: dir,
        }
    }
}

struct Harness {
    controller: SessionController,
    journal: Journal,
    output: Arc<FakeOutput>,
    shared: Arc<SessionShared>,
    permissions: Arc<FakePermissions>,
    route: Arc<FakeAudioRoute>,
    sink: Arc<ChannelSink>,
    notifications: mpsc::UnboundedReceiver<SessionNotification>,
    output_dir: PathBuf,
    _dir: TempDir,
}

impl Harness {
    fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    fn clear_journal(&self) {
        self.journal.lock().unwrap().clear();
    }

    /// Apply every queued command and event, then drain notifications
    async fn settle(&mut self) -> Vec<SessionNotification> {
        self.controller.flush().await;
        let mut seen = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            seen.push(notification);
        }
        seen
    }

    async fn start_session(&self) -> Result<(), CaptureError> {
        let (tx, rx) = oneshot::channel();
        self.controller.start_capture_session(move |result| {
            let _ = tx.send(result);
        });
        rx.await.unwrap()
    }

    /// Setup and start the session
    async fn ready(&mut self) {
        self.controller.setup_session().await.unwrap();
        self.start_session().await.unwrap();
        assert_eq!(self.controller.session_state(), SessionState::Running);
        self.settle().await;
        self.clear_journal();
    }
}

fn stopped(path: &Path, error: Option<CaptureError>) -> SessionNotification {
    SessionNotification::RecordingStopped {
        url: Some(path.to_path_buf()),
        error,
    }
}

fn failed(reason: &str) -> Option<CaptureError> {
    Some(CaptureError::RecordingFailed(Some(reason.to_string())))
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn video_setup_wires_inputs_then_output_in_one_transaction() {
    let h = Setup::new(CaptureMode::Video).build();

    h.controller.setup_session().await.unwrap();

    assert_eq!(
        h.journal(),
        vec![
            "begin".to_string(),
            format!("preset:{}", SessionPreset::Hd1920x1080),
            "add_input:video".to_string(),
            "add_input:audio".to_string(),
            "add_output".to_string(),
            "commit".to_string(),
            "subscribe".to_string(),
        ]
    );
    assert_eq!(h.controller.session_state(), SessionState::Idle);
    assert_eq!(
        *h.output.connection.stabilization.lock().unwrap(),
        Some(StabilizationMode::Auto)
    );
}

#[tokio::test]
async fn audio_setup_skips_video() {
    let h = Setup::new(CaptureMode::Audio).build();

    h.controller.setup_session().await.unwrap();

    let journal = h.journal();
    assert!(journal.contains(&"add_input:audio".to_string()));
    assert!(!journal.contains(&"add_input:video".to_string()));
    assert!(journal.contains(&format!("preset:{}", SessionPreset::High)));
    assert!(h.output.connection.stabilization.lock().unwrap().is_none());
    assert_eq!(*h.permissions.requests.lock().unwrap(), Vec::<MediaKind>::new());
}

#[tokio::test]
async fn preset_falls_back_to_high() {
    let mut setup = Setup::new(CaptureMode::Video);
    setup.presets = vec![SessionPreset::High];
    let h = setup.build();

    h.controller.setup_session().await.unwrap();

    assert!(h.journal().contains(&format!("preset:{}", SessionPreset::High)));
}

#[tokio::test]
async fn undetermined_permissions_are_requested_audio_first() {
    let mut setup = Setup::new(CaptureMode::Video);
    setup.audio = AuthorizationStatus::NotDetermined;
    setup.video = AuthorizationStatus::NotDetermined;
    let h = setup.build();

    h.controller.setup_session().await.unwrap();

    assert_eq!(
        *h.permissions.requests.lock().unwrap(),
        vec![MediaKind::Audio, MediaKind::Video]
    );
}

#[tokio::test]
async fn denied_audio_fails_before_touching_hardware() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.audio = AuthorizationStatus::Denied;
    let h = setup.build();

    let err = h.controller.setup_session().await.unwrap_err();

    assert_eq!(err, CaptureError::PermissionDenied(MediaKind::Audio));
    assert!(h.journal().is_empty());
    assert!(h.route.requests.lock().unwrap().is_empty());
    assert_eq!(h.controller.session_state(), SessionState::Uninitialized);
}

#[tokio::test]
async fn restricted_camera_fails_video_setup() {
    let mut setup = Setup::new(CaptureMode::Video);
    setup.video = AuthorizationStatus::Restricted;
    let h = setup.build();

    let err = h.controller.setup_session().await.unwrap_err();

    assert_eq!(err, CaptureError::PermissionDenied(MediaKind::Video));
    assert_eq!(h.shared.created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn refused_request_is_permission_denied() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.audio = AuthorizationStatus::NotDetermined;
    setup.grant_on_request = false;
    let h = setup.build();

    let err = h.controller.setup_session().await.unwrap_err();

    assert_eq!(err, CaptureError::PermissionDenied(MediaKind::Audio));
    assert_eq!(*h.permissions.requests.lock().unwrap(), vec![MediaKind::Audio]);
}

#[tokio::test]
async fn audio_route_failure_is_setup_failed() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.route_failure = Some("route busy");
    let h = setup.build();

    let err = h.controller.setup_session().await.unwrap_err();

    assert_eq!(err, CaptureError::SetupFailed("route busy".to_string()));
    assert!(h.journal().is_empty());
}

#[tokio::test]
async fn video_route_uses_video_recording_mode() {
    let h = Setup::new(CaptureMode::Video).build();

    h.controller.setup_session().await.unwrap();

    let requests = h.route.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].category, AudioCategory::PlayAndRecord);
    assert_eq!(requests[0].mode, AudioMode::VideoRecording);
}

#[tokio::test]
async fn audio_route_records_without_playback() {
    let h = Setup::new(CaptureMode::Audio).build();

    h.controller.setup_session().await.unwrap();

    let requests = h.route.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].category, AudioCategory::Record);
    assert_eq!(requests[0].mode, AudioMode::Default);
}

#[tokio::test]
async fn missing_camera_leaves_session_uncommitted() {
    let mut setup = Setup::new(CaptureMode::Video);
    setup.has_video_device = false;
    let h = setup.build();

    let err = h.controller.setup_session().await.unwrap_err();

    assert_eq!(err, CaptureError::DeviceNotFound(MediaKind::Video));
    assert!(!h.journal().contains(&"commit".to_string()));
    assert!(!h.journal().contains(&"subscribe".to_string()));
    assert_eq!(h.controller.session_state(), SessionState::Configuring);

    // Not reusable until torn down
    let err = h.controller.setup_session().await.unwrap_err();
    assert!(matches!(err, CaptureError::SetupFailed(_)));
}

#[tokio::test]
async fn rejected_input_is_io_error() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.accept_inputs = false;
    let h = setup.build();

    let err = h.controller.setup_session().await.unwrap_err();

    assert!(matches!(err, CaptureError::InputOutputError(_)));
    assert!(!h.journal().contains(&"add_input:audio".to_string()));
}

#[tokio::test]
async fn rejected_output_is_io_error() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.accept_output = false;
    let h = setup.build();

    let err = h.controller.setup_session().await.unwrap_err();

    assert!(matches!(err, CaptureError::InputOutputError(_)));
    assert!(!h.journal().contains(&"add_output".to_string()));
}

#[tokio::test]
async fn failed_setup_is_released_by_teardown() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.accept_output = false;
    let h = setup.build();

    assert!(h.controller.setup_session().await.is_err());
    h.controller.teardown_session();
    h.controller.flush().await;

    assert_eq!(h.controller.session_state(), SessionState::Uninitialized);
    let journal = h.journal();
    assert!(journal.contains(&"remove_input:audio".to_string()));
    assert!(!journal.contains(&"remove_output".to_string()));
}

#[tokio::test]
async fn repeated_setup_is_rejected() {
    let h = Setup::new(CaptureMode::Audio).build();

    h.controller.setup_session().await.unwrap();
    let err = h.controller.setup_session().await.unwrap_err();

    assert!(matches!(err, CaptureError::SetupFailed(_)));
    assert_eq!(h.shared.created.load(Ordering::SeqCst), 1);
    assert_eq!(h.controller.session_state(), SessionState::Idle);
}

// ---------------------------------------------------------------------------
// Session start / stop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_before_setup_fails_on_both_channels() {
    let mut h = Setup::new(CaptureMode::Audio).build();

    let err = h.start_session().await.unwrap_err();

    assert_eq!(err, CaptureError::SetupFailed("not initialized".to_string()));
    assert_eq!(
        h.settle().await,
        vec![SessionNotification::ServiceFailed(CaptureError::SetupFailed(
            "not initialized".to_string()
        ))]
    );
}

#[tokio::test]
async fn start_twice_reports_already_running() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.controller.setup_session().await.unwrap();

    h.start_session().await.unwrap();
    let err = h.start_session().await.unwrap_err();

    assert_eq!(err, CaptureError::SetupFailed("already running".to_string()));
    assert!(h.settle().await.is_empty());
    assert_eq!(h.controller.session_state(), SessionState::Running);
}

#[tokio::test]
async fn stop_session_returns_to_idle() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    h.controller.stop_capture_session();
    h.controller.flush().await;
    assert_eq!(h.controller.session_state(), SessionState::Idle);
    assert_eq!(h.journal(), vec!["stop".to_string()]);

    h.controller.stop_capture_session();
    h.controller.flush().await;
    assert_eq!(h.journal(), vec!["stop".to_string()]);

    h.start_session().await.unwrap();
    assert_eq!(h.controller.session_state(), SessionState::Running);
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recording_requires_running_session() {
    let h = Setup::new(CaptureMode::Audio).build();
    h.controller.setup_session().await.unwrap();

    let err = h.controller.start_recording("clip").await.unwrap_err();

    assert_eq!(err, CaptureError::SessionNotRunning);
    assert_eq!(h.output.starts.load(Ordering::SeqCst), 0);
    assert_eq!(h.controller.recording_state(), RecordingState::NotRecording);
}

#[tokio::test]
async fn recording_without_setup_is_session_not_running() {
    let h = Setup::new(CaptureMode::Video).build();

    let err = h.controller.start_recording("clip").await.unwrap_err();

    assert_eq!(err, CaptureError::SessionNotRunning);
}

#[tokio::test]
async fn video_path_uses_name_timestamp_and_mp4() {
    let mut h = Setup::new(CaptureMode::Video).build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();

    assert!(path.ends_with("clip-1000.mp4"));
    assert_eq!(path.parent().unwrap(), h.output_dir.as_path());
    assert!(h.output_dir.is_dir());
}

#[tokio::test]
async fn audio_path_uses_m4a() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();

    assert!(path.ends_with("clip-1000.m4a"));
}

#[tokio::test]
async fn start_then_stop_notifies_once_each() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();
    assert_eq!(
        h.settle().await,
        vec![SessionNotification::RecordingStarted]
    );
    assert!(h.controller.is_recording());

    h.controller.stop_recording();
    assert_eq!(h.settle().await, vec![stopped(&path, None)]);

    assert!(!h.controller.is_recording());
    assert_eq!(h.controller.recording_state(), RecordingState::NotRecording);
    assert_eq!(h.journal(), vec!["output.start", "output.stop"]);
}

#[tokio::test]
async fn recording_states_follow_output_events() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_start = false;
    setup.auto_finish = false;
    let mut h = setup.build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();
    assert_eq!(h.controller.recording_state(), RecordingState::Starting);
    assert!(h.settle().await.is_empty());

    h.output.emit_started();
    assert_eq!(
        h.settle().await,
        vec![SessionNotification::RecordingStarted]
    );
    assert_eq!(h.controller.recording_state(), RecordingState::Recording);

    h.controller.stop_recording();
    h.controller.flush().await;
    assert_eq!(h.controller.recording_state(), RecordingState::Stopping);

    h.output.emit_finished(None);
    assert_eq!(h.settle().await, vec![stopped(&path, None)]);
    assert_eq!(h.controller.recording_state(), RecordingState::NotRecording);
}

#[tokio::test]
async fn second_start_is_rejected_without_reaching_output() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    h.controller.start_recording("first").await.unwrap();
    let err = h.controller.start_recording("second").await.unwrap_err();

    assert_eq!(err, CaptureError::RecordingInProgress);
    assert_eq!(h.output.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_starts_admit_exactly_one() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_start = false;
    let mut h = setup.build();
    h.ready().await;

    let (a, b) = tokio::join!(
        h.controller.start_recording("a"),
        h.controller.start_recording("b")
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| r == &Err(CaptureError::RecordingInProgress)));
    assert_eq!(h.output.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn finish_error_is_reported_as_recording_failed() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_finish = false;
    let mut h = setup.build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();
    h.settle().await;

    h.output.emit_finished(Some("disk full"));

    assert_eq!(h.settle().await, vec![stopped(&path, failed("disk full"))]);
    assert!(!h.controller.is_recording());
}

#[tokio::test]
async fn output_ending_on_its_own_completes_the_take() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_finish = false;
    let mut h = setup.build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();
    h.settle().await;
    assert_eq!(h.controller.recording_state(), RecordingState::Recording);

    // No stop was requested; the output finishes by itself
    h.output.emit_finished(None);

    assert_eq!(h.settle().await, vec![stopped(&path, None)]);
    assert_eq!(h.controller.recording_state(), RecordingState::NotRecording);
    assert_eq!(h.journal(), vec!["output.start"]);
    h.controller.start_recording("next").await.unwrap();
}

#[tokio::test]
async fn finish_path_from_output_is_advisory() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_finish = false;
    let mut h = setup.build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();
    h.settle().await;

    h.output
        .emit_finished_at(Some(Path::new("/elsewhere/other.m4a")), None);

    assert_eq!(h.settle().await, vec![stopped(&path, None)]);
}

#[tokio::test]
async fn failure_to_start_short_circuits() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_start = false;
    let mut h = setup.build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();
    h.output.emit_finished(Some("encoder unavailable"));

    assert_eq!(
        h.settle().await,
        vec![stopped(&path, failed("encoder unavailable"))]
    );
    assert_eq!(h.controller.recording_state(), RecordingState::NotRecording);

    // A new take is allowed afterwards
    h.controller.start_recording("retry").await.unwrap();
}

#[tokio::test]
async fn stop_before_start_confirmation_is_deferred() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_start = false;
    setup.auto_finish = false;
    let mut h = setup.build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();
    h.controller.stop_recording();
    h.controller.flush().await;

    assert_eq!(h.journal(), vec!["output.start", "output.stop"]);
    assert_eq!(h.controller.recording_state(), RecordingState::Starting);

    h.output.emit_started();
    assert_eq!(
        h.settle().await,
        vec![SessionNotification::RecordingStarted]
    );
    assert_eq!(h.controller.recording_state(), RecordingState::Stopping);

    h.output.emit_finished(None);
    assert_eq!(h.settle().await, vec![stopped(&path, None)]);
    assert_eq!(h.controller.recording_state(), RecordingState::NotRecording);
}

#[tokio::test]
async fn stop_recording_when_idle_is_a_no_op() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    h.controller.stop_recording();

    assert!(h.settle().await.is_empty());
    assert!(h.journal().is_empty());
}

#[tokio::test]
async fn unusable_name_is_file_system_error() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    let err = h.controller.start_recording("../escape").await.unwrap_err();

    assert!(matches!(err, CaptureError::FileSystemError(_)));
    assert_eq!(h.output.starts.load(Ordering::SeqCst), 0);
    assert_eq!(h.controller.recording_state(), RecordingState::NotRecording);
}

#[tokio::test]
async fn uncreatable_output_dir_is_file_system_error() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;
    std::fs::write(&h.output_dir, b"not a directory").unwrap();

    let err = h.controller.start_recording("clip").await.unwrap_err();

    assert!(matches!(err, CaptureError::FileSystemError(_)));
    assert_eq!(h.output.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rotation_is_applied_in_video_mode() {
    let mut h = Setup::new(CaptureMode::Video).build();
    h.ready().await;

    h.controller.start_recording("clip").await.unwrap();

    assert_eq!(
        *h.output.connection.rotation.lock().unwrap(),
        Some(RotationAngle::Deg90)
    );
}

#[tokio::test]
async fn fixed_connection_still_records() {
    let mut setup = Setup::new(CaptureMode::Video);
    setup.rotatable = false;
    let mut h = setup.build();
    h.ready().await;

    h.controller.start_recording("clip").await.unwrap();

    assert!(h.output.connection.rotation.lock().unwrap().is_none());
    assert_eq!(
        h.settle().await,
        vec![SessionNotification::RecordingStarted]
    );
}

#[tokio::test]
async fn audio_mode_never_rotates() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    h.controller.start_recording("clip").await.unwrap();

    assert!(h.output.connection.rotation.lock().unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Session events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn runtime_error_while_recording_forces_stop() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_finish = false;
    let mut h = setup.build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();
    h.settle().await;

    h.shared.observer().runtime_error("media services reset".to_string());
    assert_eq!(
        h.settle().await,
        vec![stopped(&path, failed("media services reset"))]
    );
    assert_eq!(h.controller.recording_state(), RecordingState::NotRecording);

    // The late finish event is stale
    h.output.emit_finished(None);
    assert!(h.settle().await.is_empty());
}

#[tokio::test]
async fn runtime_error_while_idle_is_service_failure() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    h.shared.observer().runtime_error("media services reset".to_string());

    assert_eq!(
        h.settle().await,
        vec![SessionNotification::ServiceFailed(CaptureError::Unknown(
            "media services reset".to_string()
        ))]
    );
}

#[tokio::test]
async fn interruptions_are_relayed_verbatim() {
    let mut h = Setup::new(CaptureMode::Video).build();
    h.ready().await;
    h.controller.start_recording("clip").await.unwrap();
    h.settle().await;

    let reason = InterruptionReason::DeviceInUseByAnotherClient(MediaKind::Video);
    h.shared.observer().interrupted(Some(reason.clone()));
    h.shared.observer().interrupted(None);
    h.shared.observer().interruption_ended();

    assert_eq!(
        h.settle().await,
        vec![
            SessionNotification::Interrupted(Some(reason)),
            SessionNotification::Interrupted(None),
            SessionNotification::InterruptionEnded,
        ]
    );
    assert_eq!(h.controller.recording_state(), RecordingState::Recording);
}

#[tokio::test]
async fn stopping_session_force_stops_recording() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    let path = h.controller.start_recording("clip").await.unwrap();
    h.settle().await;

    h.controller.stop_capture_session();

    // The output's own finish event arrives after the forced stop and is ignored
    assert_eq!(
        h.settle().await,
        vec![stopped(&path, failed("capture session stopped"))]
    );
    assert_eq!(h.controller.session_state(), SessionState::Idle);
    assert_eq!(h.controller.recording_state(), RecordingState::NotRecording);
    assert_eq!(h.journal(), vec!["output.start", "output.stop", "stop"]);
}

#[tokio::test]
async fn late_finish_of_forced_take_leaves_next_take_alone() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_finish = false;
    let mut h = setup.build();
    h.ready().await;

    let first = h.controller.start_recording("first").await.unwrap();
    h.settle().await;
    h.controller.stop_capture_session();
    assert_eq!(
        h.settle().await,
        vec![stopped(&first, failed("capture session stopped"))]
    );
    let (old_path, old_observer) = h.output.detach();

    h.start_session().await.unwrap();
    let second = h.controller.start_recording("second").await.unwrap();
    assert_eq!(
        h.settle().await,
        vec![SessionNotification::RecordingStarted]
    );

    old_observer.did_finish_recording(&old_path, None);

    assert!(h.settle().await.is_empty());
    assert_eq!(h.controller.recording_state(), RecordingState::Recording);
    assert!(h.output.is_recording());

    h.output.emit_finished(None);
    assert_eq!(h.settle().await, vec![stopped(&second, None)]);
}

#[tokio::test]
async fn late_start_of_forced_take_does_not_confirm_next_take() {
    let mut setup = Setup::new(CaptureMode::Audio);
    setup.auto_start = false;
    setup.auto_finish = false;
    let mut h = setup.build();
    h.ready().await;

    h.controller.start_recording("first").await.unwrap();
    h.controller.teardown_session();
    h.settle().await;
    let (old_path, old_observer) = h.output.detach();

    h.ready().await;
    h.controller.start_recording("second").await.unwrap();
    old_observer.did_start_recording(&old_path);

    assert!(h.settle().await.is_empty());
    assert_eq!(h.controller.recording_state(), RecordingState::Starting);

    h.output.emit_started();
    assert_eq!(
        h.settle().await,
        vec![SessionNotification::RecordingStarted]
    );
    assert_eq!(h.controller.recording_state(), RecordingState::Recording);
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn teardown_releases_everything_in_order() {
    let mut h = Setup::new(CaptureMode::Video).build();
    h.ready().await;

    h.controller.teardown_session();
    h.controller.flush().await;

    assert_eq!(
        h.journal(),
        vec![
            "unsubscribe",
            "stop",
            "begin",
            "remove_input:video",
            "remove_input:audio",
            "remove_output",
            "commit",
        ]
    );
    assert_eq!(
        h.controller.status(),
        ControllerStatus {
            session: SessionState::Uninitialized,
            recording: RecordingState::NotRecording,
        }
    );
}

#[tokio::test]
async fn operations_after_teardown_see_no_session() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;
    h.controller.teardown_session();
    h.settle().await;
    h.clear_journal();

    assert_eq!(
        h.controller.start_recording("clip").await,
        Err(CaptureError::SessionNotRunning)
    );
    assert_eq!(
        h.start_session().await,
        Err(CaptureError::SetupFailed("not initialized".to_string()))
    );
    h.controller.stop_recording();
    h.controller.stop_capture_session();
    h.controller.teardown_session();

    assert_eq!(
        h.settle().await,
        vec![SessionNotification::ServiceFailed(CaptureError::SetupFailed(
            "not initialized".to_string()
        ))]
    );
    assert!(h.journal().is_empty());

    // A fresh setup works again
    h.controller.setup_session().await.unwrap();
    assert_eq!(h.controller.session_state(), SessionState::Idle);
}

#[tokio::test]
async fn teardown_while_recording_force_stops() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;
    let path = h.controller.start_recording("clip").await.unwrap();
    h.settle().await;

    h.controller.teardown_session();

    assert_eq!(
        h.settle().await,
        vec![stopped(&path, failed("session torn down"))]
    );
    assert_eq!(h.controller.session_state(), SessionState::Uninitialized);
}

#[tokio::test]
async fn events_from_released_session_are_ignored() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;
    let observer = h.shared.observer();

    h.controller.teardown_session();
    h.settle().await;

    observer.runtime_error("late".to_string());
    observer.interrupted(None);
    assert!(h.settle().await.is_empty());
}

// ---------------------------------------------------------------------------
// Sink and lifetime
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sink_is_not_kept_alive() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    let sink = std::mem::replace(&mut h.sink, Arc::new(ChannelSink::new().0));
    drop(sink);

    h.shared.observer().runtime_error("nobody listening".to_string());
    h.controller.flush().await;

    assert!(matches!(
        h.notifications.try_recv(),
        Err(mpsc::error::TryRecvError::Disconnected)
    ));
}

#[tokio::test]
async fn cleared_sink_receives_nothing() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;

    h.controller.clear_notification_sink();
    h.shared.observer().runtime_error("quiet".to_string());

    assert!(h.settle().await.is_empty());
}

#[tokio::test]
async fn dropping_controller_tears_down() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;
    let Harness {
        controller,
        journal,
        shared,
        ..
    } = h;

    drop(controller);

    let journal = journal.lock().unwrap().clone();
    assert_eq!(journal.first().map(String::as_str), Some("unsubscribe"));
    assert_eq!(journal.last().map(String::as_str), Some("commit"));
    assert!(!shared.running.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_controller_on_runtime_worker_keeps_runtime_usable() {
    let mut h = Setup::new(CaptureMode::Audio).build();
    h.ready().await;
    let path = h.controller.start_recording("clip").await.unwrap();
    h.settle().await;
    let Harness {
        controller,
        journal,
        mut notifications,
        sink,
        ..
    } = h;

    drop(controller);

    assert_eq!(
        notifications.try_recv().unwrap(),
        stopped(&path, failed("session torn down"))
    );
    assert_eq!(
        journal.lock().unwrap().last().map(String::as_str),
        Some("commit")
    );
    let answer = tokio::spawn(async { 42 }).await.unwrap();
    assert_eq!(answer, 42);
    drop(sink);
}
