//! In-process capture backend
//!
//! Stands in for a platform capture stack: devices are fixed, sessions
//! track their wiring, and the file output creates the target file and
//! reports start and finish from its own thread. Runtime errors and
//! interruptions are injected through [`VirtualControls`].

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::application::ports::{
    CaptureBackend, CaptureDevice, CaptureSession, DeviceDiscovery, DeviceInput, FileOutput,
    RecordingObserver, SessionObserver, StabilizationMode, VideoConnection,
};
use crate::domain::capture::{
    DevicePosition, InterruptionReason, MediaKind, RotationAngle, SessionPreset,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Fixed set of virtual devices
pub struct VirtualDeviceDiscovery {
    devices: Vec<CaptureDevice>,
}

impl VirtualDeviceDiscovery {
    /// Front and back cameras plus one microphone
    pub fn new() -> Self {
        Self::with_devices(vec![
            CaptureDevice {
                id: "virtual:camera:front".to_string(),
                name: "Virtual Front Camera".to_string(),
                kind: MediaKind::Video,
                position: DevicePosition::Front,
            },
            CaptureDevice {
                id: "virtual:camera:back".to_string(),
                name: "Virtual Back Camera".to_string(),
                kind: MediaKind::Video,
                position: DevicePosition::Back,
            },
            CaptureDevice {
                id: "virtual:microphone".to_string(),
                name: "Virtual Microphone".to_string(),
                kind: MediaKind::Audio,
                position: DevicePosition::Unspecified,
            },
        ])
    }

    pub fn with_devices(devices: Vec<CaptureDevice>) -> Self {
        Self { devices }
    }
}

impl Default for VirtualDeviceDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDiscovery for VirtualDeviceDiscovery {
    /// `Unspecified` matches a device at any position
    fn find(&self, kind: MediaKind, position: DevicePosition) -> Option<CaptureDevice> {
        self.devices
            .iter()
            .filter(|d| d.kind == kind)
            .find(|d| position == DevicePosition::Unspecified || d.position == position)
            .cloned()
    }

    fn list(&self, kind: MediaKind) -> Vec<CaptureDevice> {
        self.devices
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }
}

/// Behaviour knobs of the virtual backend
#[derive(Debug, Clone)]
pub struct VirtualBackendOptions {
    /// Delay between start_recording and the started event
    pub start_latency: Duration,
    pub presets: Vec<SessionPreset>,
    pub accept_inputs: bool,
    pub accept_output: bool,
    pub stabilization: bool,
    pub rotation: bool,
}

impl Default for VirtualBackendOptions {
    fn default() -> Self {
        Self {
            start_latency: Duration::from_millis(50),
            presets: vec![SessionPreset::Hd1920x1080, SessionPreset::High],
            accept_inputs: true,
            accept_output: true,
            stabilization: true,
            rotation: true,
        }
    }
}

type ObserverSlot = Arc<Mutex<Option<Arc<dyn SessionObserver>>>>;

/// Capture backend producing virtual sessions and outputs
pub struct VirtualCaptureBackend {
    options: VirtualBackendOptions,
    observer: ObserverSlot,
}

impl VirtualCaptureBackend {
    pub fn new() -> Self {
        Self::with_options(VirtualBackendOptions::default())
    }

    pub fn with_options(options: VirtualBackendOptions) -> Self {
        Self {
            options,
            observer: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle for injecting session events
    pub fn controls(&self) -> VirtualControls {
        VirtualControls {
            observer: Arc::clone(&self.observer),
        }
    }
}

impl Default for VirtualCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for VirtualCaptureBackend {
    fn create_session(&self) -> Box<dyn CaptureSession> {
        Box::new(VirtualSession {
            options: self.options.clone(),
            observer: Arc::clone(&self.observer),
            preset: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            configuring: false,
            running: false,
        })
    }

    fn create_file_output(&self) -> Arc<dyn FileOutput> {
        Arc::new(VirtualFileOutput::new(
            self.options.start_latency,
            VirtualVideoConnection::new(self.options.stabilization, self.options.rotation),
        ))
    }
}

/// Injects events into whichever session is subscribed
#[derive(Clone)]
pub struct VirtualControls {
    observer: ObserverSlot,
}

impl VirtualControls {
    fn observer(&self) -> Option<Arc<dyn SessionObserver>> {
        lock(&self.observer).clone()
    }

    /// Report a runtime error. Returns false if no session is subscribed.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        match self.observer() {
            Some(observer) => {
                observer.runtime_error(reason.into());
                true
            }
            None => false,
        }
    }

    pub fn interrupt(&self, reason: Option<InterruptionReason>) -> bool {
        match self.observer() {
            Some(observer) => {
                observer.interrupted(reason);
                true
            }
            None => false,
        }
    }

    pub fn end_interruption(&self) -> bool {
        match self.observer() {
            Some(observer) => {
                observer.interruption_ended();
                true
            }
            None => false,
        }
    }
}

struct VirtualSession {
    options: VirtualBackendOptions,
    observer: ObserverSlot,
    preset: Option<SessionPreset>,
    inputs: Vec<DeviceInput>,
    outputs: Vec<Arc<dyn FileOutput>>,
    configuring: bool,
    running: bool,
}

fn same_output(a: &Arc<dyn FileOutput>, b: &Arc<dyn FileOutput>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl CaptureSession for VirtualSession {
    fn begin_configuration(&mut self) {
        self.configuring = true;
    }

    fn commit_configuration(&mut self) {
        if !self.configuring {
            tracing::debug!("Commit without a configuration transaction");
        }
        self.configuring = false;
        tracing::debug!(
            preset = ?self.preset,
            inputs = self.inputs.len(),
            outputs = self.outputs.len(),
            "Virtual session configured"
        );
    }

    fn can_set_preset(&self, preset: SessionPreset) -> bool {
        self.options.presets.contains(&preset)
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        self.preset = Some(preset);
    }

    fn can_add_input(&self, input: &DeviceInput) -> bool {
        self.options.accept_inputs
            && !self
                .inputs
                .iter()
                .any(|existing| existing.device().id == input.device().id)
    }

    fn add_input(&mut self, input: &DeviceInput) {
        self.inputs.push(input.clone());
    }

    fn remove_input(&mut self, input: &DeviceInput) {
        self.inputs.retain(|existing| existing != input);
    }

    fn can_add_output(&self, _output: &Arc<dyn FileOutput>) -> bool {
        self.options.accept_output && self.outputs.is_empty()
    }

    fn add_output(&mut self, output: Arc<dyn FileOutput>) {
        self.outputs.push(output);
    }

    fn remove_output(&mut self, output: &Arc<dyn FileOutput>) {
        self.outputs.retain(|existing| !same_output(existing, output));
    }

    fn start_running(&mut self) {
        self.running = true;
    }

    fn stop_running(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) {
        *lock(&self.observer) = Some(observer);
    }

    fn unsubscribe(&mut self) {
        *lock(&self.observer) = None;
    }
}

/// Video connection remembering what was applied to it
pub struct VirtualVideoConnection {
    stabilization_supported: bool,
    rotation_supported: bool,
    stabilization: Mutex<StabilizationMode>,
    rotation: Mutex<RotationAngle>,
}

impl VirtualVideoConnection {
    pub fn new(stabilization_supported: bool, rotation_supported: bool) -> Self {
        Self {
            stabilization_supported,
            rotation_supported,
            stabilization: Mutex::new(StabilizationMode::Off),
            rotation: Mutex::new(RotationAngle::Deg0),
        }
    }

    pub fn stabilization(&self) -> StabilizationMode {
        *lock(&self.stabilization)
    }

    pub fn rotation(&self) -> RotationAngle {
        *lock(&self.rotation)
    }
}

impl VideoConnection for VirtualVideoConnection {
    fn supports_stabilization(&self) -> bool {
        self.stabilization_supported
    }

    fn set_stabilization(&self, mode: StabilizationMode) {
        *lock(&self.stabilization) = mode;
    }

    fn supports_rotation(&self, _angle: RotationAngle) -> bool {
        self.rotation_supported
    }

    fn set_rotation(&self, angle: RotationAngle) {
        *lock(&self.rotation) = angle;
    }
}

/// File output writing an empty container and reporting from a thread
pub struct VirtualFileOutput {
    start_latency: Duration,
    recording: Arc<AtomicBool>,
    stop: Mutex<Option<mpsc::Sender<()>>>,
    connection: Arc<VirtualVideoConnection>,
}

impl VirtualFileOutput {
    pub fn new(start_latency: Duration, connection: VirtualVideoConnection) -> Self {
        Self {
            start_latency,
            recording: Arc::new(AtomicBool::new(false)),
            stop: Mutex::new(None),
            connection: Arc::new(connection),
        }
    }

    pub fn connection(&self) -> Arc<VirtualVideoConnection> {
        Arc::clone(&self.connection)
    }

    fn run(
        path: PathBuf,
        latency: Duration,
        recording: Arc<AtomicBool>,
        stop: mpsc::Receiver<()>,
        observer: Arc<dyn RecordingObserver>,
    ) {
        if let Err(e) = File::create(&path) {
            recording.store(false, Ordering::SeqCst);
            observer.did_finish_recording(&path, Some(format!("cannot create file: {}", e)));
            return;
        }

        thread::sleep(latency);
        observer.did_start_recording(&path);

        // Either a stop request or the output being dropped ends the take
        let _ = stop.recv();
        recording.store(false, Ordering::SeqCst);
        observer.did_finish_recording(&path, None);
    }
}

impl FileOutput for VirtualFileOutput {
    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    fn video_connection(&self) -> Option<Arc<dyn VideoConnection>> {
        let connection: Arc<dyn VideoConnection> = self.connection.clone();
        Some(connection)
    }

    fn start_recording(&self, path: &Path, observer: Arc<dyn RecordingObserver>) {
        if self.recording.swap(true, Ordering::SeqCst) {
            tracing::warn!(path = %path.display(), "Virtual output already recording");
            return;
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        *lock(&self.stop) = Some(stop_tx);

        let path = path.to_path_buf();
        let latency = self.start_latency;
        let recording = Arc::clone(&self.recording);
        let failed_observer = Arc::clone(&observer);
        let failed_path = path.clone();

        let spawned = thread::Builder::new()
            .name("virtual-output".to_string())
            .spawn(move || Self::run(path, latency, recording, stop_rx, observer));

        if let Err(e) = spawned {
            self.recording.store(false, Ordering::SeqCst);
            lock(&self.stop).take();
            failed_observer
                .did_finish_recording(&failed_path, Some(format!("output thread failed: {}", e)));
        }
    }

    fn stop_recording(&self) {
        if let Some(stop) = lock(&self.stop).take() {
            let _ = stop.send(());
        }
    }
}
