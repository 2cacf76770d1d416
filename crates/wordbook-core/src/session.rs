//! Explicit session state for sync operations.
//!
//! Every reconciler call receives a `SessionContext` describing who owns
//! the cloud rows and whether the network may be used at all. There is no
//! ambient global session.

use std::fmt;

use crate::auth::AuthSession;

/// The credential that scopes cloud rows.
///
/// A row belongs to exactly one owner; a deployment runs in one scope mode
/// and never mixes them per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerScope {
    /// Authenticated user identity
    User { id: String },
    /// Anonymous per-installation device identity
    Device { id: String },
}

impl OwnerScope {
    /// The owner column value for rows under this scope
    #[must_use]
    pub fn owner_key(&self) -> String {
        match self {
            Self::User { id } => format!("user:{id}"),
            Self::Device { id } => format!("device:{id}"),
        }
    }
}

impl fmt::Display for OwnerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.owner_key())
    }
}

/// Per-invocation sync session.
///
/// `owner` is absent when no credential is available (user scope without a
/// login); such a session can never reach the cloud.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    owner: Option<OwnerScope>,
    access_token: Option<String>,
    online: bool,
}

impl SessionContext {
    /// A session that can reach the cloud under the given scope
    #[must_use]
    pub const fn connected(owner: OwnerScope, access_token: Option<String>) -> Self {
        Self {
            owner: Some(owner),
            access_token,
            online: true,
        }
    }

    /// A session with no usable credential; sync silently degrades
    #[must_use]
    pub const fn disconnected() -> Self {
        Self {
            owner: None,
            access_token: None,
            online: false,
        }
    }

    /// User-scoped session from a live login
    #[must_use]
    pub fn for_user(session: &AuthSession) -> Self {
        Self::connected(
            OwnerScope::User {
                id: session.user.id.clone(),
            },
            Some(session.access_token.clone()),
        )
    }

    /// Device-scoped session; authenticates with the public anon key only
    #[must_use]
    pub fn for_device(device_id: impl Into<String>) -> Self {
        Self::connected(
            OwnerScope::Device {
                id: device_id.into(),
            },
            None,
        )
    }

    /// Force the online flag, e.g. for an `--offline` invocation
    #[must_use]
    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// Whether sync may be attempted at all
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.online && self.owner.is_some()
    }

    #[must_use]
    pub const fn owner(&self) -> Option<&OwnerScope> {
        self.owner.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionContext")
            .field("owner", &self.owner)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("online", &self.online)
            .finish()
    }
}
