//! Session and recording state machines

use std::fmt;
use thiserror::Error;

/// Capture session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Configuring,
    /// Configured, not running
    Idle,
    Running,
    TearingDown,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Configuring => "configuring",
            Self::Idle => "idle",
            Self::Running => "running",
            Self::TearingDown => "tearing down",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recording states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordingState {
    #[default]
    NotRecording,
    Starting,
    Recording,
    Stopping,
}

impl RecordingState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotRecording => "not recording",
            Self::Starting => "starting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        }
    }

    /// Whether a recording is in flight
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::NotRecording)
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: &'static str,
    pub action: &'static str,
}

/// Session lifecycle.
///
/// State machine:
///   UNINITIALIZED -> CONFIGURING (begin_setup)
///   CONFIGURING -> IDLE (commit_setup)
///   IDLE -> RUNNING (start)
///   RUNNING -> IDLE (stop)
///   any -> TEARING_DOWN (begin_teardown)
///   TEARING_DOWN -> UNINITIALIZED (finish_teardown)
#[derive(Debug, Default)]
pub struct SessionLifecycle {
    state: SessionState,
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    fn transition(
        &mut self,
        from: SessionState,
        to: SessionState,
        action: &'static str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != from {
            return Err(InvalidStateTransition {
                current_state: self.state.as_str(),
                action,
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn begin_setup(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Uninitialized,
            SessionState::Configuring,
            "set up session",
        )
    }

    pub fn commit_setup(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Configuring, SessionState::Idle, "commit setup")
    }

    pub fn start(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Idle, SessionState::Running, "start session")
    }

    pub fn stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Running, SessionState::Idle, "stop session")
    }

    /// Teardown is accepted from every state except an ongoing teardown
    pub fn begin_teardown(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state == SessionState::TearingDown {
            return Err(InvalidStateTransition {
                current_state: self.state.as_str(),
                action: "tear down session",
            });
        }
        self.state = SessionState::TearingDown;
        Ok(())
    }

    pub fn finish_teardown(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::TearingDown,
            SessionState::Uninitialized,
            "finish teardown",
        )
    }
}

/// What a stop request did to the recording lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    /// RECORDING -> STOPPING happened now
    Applied,
    /// Still STARTING; STOPPING follows the start confirmation
    Deferred,
}

/// Recording lifecycle.
///
/// State machine:
///   NOT_RECORDING -> STARTING (begin, session must be running)
///   STARTING -> RECORDING (confirm_started)
///   RECORDING -> STOPPING (request_stop)
///   STARTING/STOPPING -> NOT_RECORDING (finish)
///   STARTING/RECORDING/STOPPING -> NOT_RECORDING (abort)
///
/// A stop requested while STARTING is held until the start is confirmed,
/// so observers always see STARTING -> RECORDING -> STOPPING. A recording
/// never finishes straight from RECORDING; it stops first.
#[derive(Debug, Default)]
pub struct RecordingLifecycle {
    state: RecordingState,
    stop_pending: bool,
}

impl RecordingLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn stop_pending(&self) -> bool {
        self.stop_pending
    }

    fn invalid(&self, action: &'static str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.state.as_str(),
            action,
        }
    }

    /// Transition from NOT_RECORDING to STARTING
    pub fn begin(&mut self, session: SessionState) -> Result<(), InvalidStateTransition> {
        if session != SessionState::Running {
            return Err(InvalidStateTransition {
                current_state: session.as_str(),
                action: "start recording",
            });
        }
        if self.state != RecordingState::NotRecording {
            return Err(self.invalid("start recording"));
        }
        self.state = RecordingState::Starting;
        self.stop_pending = false;
        Ok(())
    }

    /// Transition from STARTING to RECORDING, then on to STOPPING if a
    /// stop was requested in the meantime
    pub fn confirm_started(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != RecordingState::Starting {
            return Err(self.invalid("confirm recording start"));
        }
        self.state = RecordingState::Recording;
        if self.stop_pending {
            self.stop_pending = false;
            self.state = RecordingState::Stopping;
        }
        Ok(())
    }

    /// Request the recording to stop
    pub fn request_stop(&mut self) -> Result<StopRequest, InvalidStateTransition> {
        match self.state {
            RecordingState::Starting => {
                self.stop_pending = true;
                Ok(StopRequest::Deferred)
            }
            RecordingState::Recording => {
                self.state = RecordingState::Stopping;
                Ok(StopRequest::Applied)
            }
            _ => Err(self.invalid("stop recording")),
        }
    }

    /// Complete the recording once the output reports it finished
    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        if !matches!(
            self.state,
            RecordingState::Starting | RecordingState::Stopping
        ) {
            return Err(self.invalid("finish recording"));
        }
        self.state = RecordingState::NotRecording;
        self.stop_pending = false;
        Ok(())
    }

    /// Short-circuit to NOT_RECORDING after a runtime failure or forced stop
    pub fn abort(&mut self) -> Result<(), InvalidStateTransition> {
        if !self.state.is_active() {
            return Err(self.invalid("abort recording"));
        }
        self.state = RecordingState::NotRecording;
        self.stop_pending = false;
        Ok(())
    }
}
