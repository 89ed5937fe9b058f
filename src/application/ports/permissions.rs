//! Capture permission port interface

use async_trait::async_trait;

use crate::domain::capture::MediaKind;

/// Authorization state of one media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Authorized,
    Denied,
    /// Blocked by policy; the user cannot grant it
    Restricted,
    /// Never asked; a request will prompt
    NotDetermined,
}

/// Port for platform capture permissions
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Current authorization for a media kind, without prompting
    fn status(&self, kind: MediaKind) -> AuthorizationStatus;

    /// Ask for access. Resolves once the user or platform decides.
    ///
    /// # Returns
    /// `true` if access was granted
    async fn request_access(&self, kind: MediaKind) -> bool;
}
