use crate::backend::Datastore;
use crate::error::{Error, Result};
use crate::models::Role;
use crate::notify::Notifier;
use crate::routes::Route;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub const ACCESS_DENIED: &str = "Access denied. Admin privileges required.";

/// Outcome of looking up the signed-in user's profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    Loading,
    Resolved { role: Role },
    /// Signed in but no profile row exists
    Missing,
}

impl RoleState {
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleState::Resolved { role } => Some(*role),
            _ => None,
        }
    }

    /// False until a profile with the admin role has actually been read
    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RoleState::Loading)
    }
}

/// Derives role and admin flag from the remote profile record, uncached
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn Datastore>,
    notifier: Notifier,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn Datastore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    pub async fn resolve(&self, user_id: Uuid) -> Result<RoleState> {
        let state = match self.store.profile(user_id).await? {
            Some(profile) => RoleState::Resolved { role: profile.role },
            None => {
                warn!("No profile row for user {}", user_id);
                RoleState::Missing
            }
        };
        debug!("Resolved role for {}: {:?}", user_id, state);
        Ok(state)
    }

    /// Gate an admin-only view; a resolved non-admin is told and sent home
    pub fn require_admin(&self, state: RoleState) -> Result<()> {
        if state.is_admin() {
            return Ok(());
        }
        if !state.is_loading() {
            self.notifier.error(ACCESS_DENIED);
        }
        Err(Error::AccessDenied {
            redirect: Route::Home,
        })
    }
}
