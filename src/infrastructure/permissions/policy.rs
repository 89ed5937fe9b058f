//! Config-driven permission provider
//!
//! Desktop platforms have no capture permission prompt of their own, so
//! access is decided per media kind by the configured policy. The `prompt`
//! policy asks on the terminal the first time and remembers the answer.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::ports::{AuthorizationStatus, PermissionProvider};
use crate::domain::capture::MediaKind;
use crate::domain::config::AccessPolicy;

type Prompt = Arc<dyn Fn(MediaKind) -> bool + Send + Sync>;

/// Ask on stderr/stdin whether capture of `kind` is allowed
pub fn stdin_prompt(kind: MediaKind) -> bool {
    let device = match kind {
        MediaKind::Audio => "microphone",
        MediaKind::Video => "camera",
    };
    eprint!("Allow access to the {}? [y/N] ", device);
    let _ = io::stderr().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Permission provider answering from per-kind access policies
pub struct PolicyPermissions {
    camera: AccessPolicy,
    microphone: AccessPolicy,
    prompt: Prompt,
    decisions: Mutex<HashMap<MediaKind, bool>>,
}

impl PolicyPermissions {
    pub fn new(camera: AccessPolicy, microphone: AccessPolicy) -> Self {
        Self::with_prompt(camera, microphone, stdin_prompt)
    }

    /// Use a custom question for the `prompt` policy
    pub fn with_prompt<F>(camera: AccessPolicy, microphone: AccessPolicy, prompt: F) -> Self
    where
        F: Fn(MediaKind) -> bool + Send + Sync + 'static,
    {
        Self {
            camera,
            microphone,
            prompt: Arc::new(prompt),
            decisions: Mutex::new(HashMap::new()),
        }
    }

    fn policy(&self, kind: MediaKind) -> AccessPolicy {
        match kind {
            MediaKind::Video => self.camera,
            MediaKind::Audio => self.microphone,
        }
    }

    fn decision(&self, kind: MediaKind) -> Option<bool> {
        self.decisions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .copied()
    }

    fn remember(&self, kind: MediaKind, granted: bool) {
        self.decisions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind, granted);
    }
}

#[async_trait]
impl PermissionProvider for PolicyPermissions {
    fn status(&self, kind: MediaKind) -> AuthorizationStatus {
        match self.policy(kind) {
            AccessPolicy::Granted => AuthorizationStatus::Authorized,
            AccessPolicy::Denied => AuthorizationStatus::Denied,
            AccessPolicy::Restricted => AuthorizationStatus::Restricted,
            AccessPolicy::Prompt => match self.decision(kind) {
                Some(true) => AuthorizationStatus::Authorized,
                Some(false) => AuthorizationStatus::Denied,
                None => AuthorizationStatus::NotDetermined,
            },
        }
    }

    async fn request_access(&self, kind: MediaKind) -> bool {
        match self.policy(kind) {
            AccessPolicy::Granted => true,
            AccessPolicy::Denied | AccessPolicy::Restricted => false,
            AccessPolicy::Prompt => {
                if let Some(granted) = self.decision(kind) {
                    return granted;
                }

                // Reading the terminal blocks
                let prompt = Arc::clone(&self.prompt);
                let granted = tokio::task::spawn_blocking(move || prompt(kind))
                    .await
                    .unwrap_or(false);
                tracing::debug!(%kind, granted, "Permission prompt answered");
                self.remember(kind, granted);
                granted
            }
        }
    }
}
