// ── Session context ──
//
// The authenticated actor, resolved once at startup and handed to the
// check-in controller as a read-only value. Nothing in core reaches for
// ambient auth state.

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::{debug, info};

use univent_api::{ApiClient, UserProfile, UserRole};

use crate::config::AuthCredentials;
use crate::error::CoreError;

/// Capability level of the actor running a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Organizer,
    Admin,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Student => Self::Student,
            UserRole::Organizer => Self::Organizer,
            UserRole::Admin => Self::Admin,
        }
    }
}

impl Role {
    /// Whether this role may operate a check-in station.
    pub fn can_check_in(self) -> bool {
        matches!(self, Self::Organizer | Self::Admin)
    }
}

/// Identity of the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl From<UserProfile> for Actor {
    fn from(user: UserProfile) -> Self {
        Self {
            display_name: user.display_name(),
            id: user.id,
            email: user.email,
            role: user.role.into(),
        }
    }
}

/// Capability check for the check-in screen.
///
/// Client-side only: it decides whether a scanning session is offered at
/// all. The backend enforces the real authorization on every validation.
pub fn authorize(role: Role) -> Result<(), CoreError> {
    if role.can_check_in() {
        Ok(())
    } else {
        Err(CoreError::AccessDenied { role })
    }
}

/// Read-only session handed to controllers at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    actor: Actor,
}

impl SessionContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    /// Authenticate `client` with `auth` and resolve the actor behind it.
    ///
    /// Password credentials are exchanged for a token; a pre-issued token
    /// is installed as-is and verified with `GET /api/auth/me`.
    pub async fn establish(client: &ApiClient, auth: &AuthCredentials) -> Result<Self, CoreError> {
        let user = match auth {
            AuthCredentials::Password { email, password } => {
                debug!(email, "authenticating with password");
                client.login(email, password).await?
            }
            AuthCredentials::Token(token) => {
                debug!("authenticating with pre-issued token");
                client.set_token(token.clone());
                client.current_user().await?
            }
        };

        let actor = Actor::from(user);
        info!(actor = %actor.email, role = %actor.role, "session established");
        Ok(Self { actor })
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn role(&self) -> Role {
        self.actor.role
    }

    /// `authorize` applied to this session's actor.
    pub fn authorize_check_in(&self) -> Result<(), CoreError> {
        authorize(self.actor.role)
    }
}
