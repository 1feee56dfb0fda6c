use crate::backend::AuthService;
use crate::error::{Error, FieldError, Result};
use crate::models::{Role, User};
use crate::routes::Route;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Process-wide identity context, built once and handed to every view
#[derive(Clone)]
pub struct SessionContext {
    auth: Arc<dyn AuthService>,
    current: Arc<watch::Sender<Option<User>>>,
}

impl SessionContext {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            auth,
            current: Arc::new(sender),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    /// The signed-in user, or an error redirecting to the sign-in page for `role`
    pub fn require_user(&self, role: Option<Role>) -> Result<User> {
        self.current_user().ok_or(Error::NotAuthenticated {
            redirect: Route::Auth { role },
        })
    }

    /// Observe sign-in and sign-out
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }

    pub async fn sign_up(&self, email: &str, password: &str, role: Role) -> Result<User> {
        let mut errors = Vec::new();
        if email.trim().is_empty() {
            errors.push(FieldError::new("email", "is required"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if role == Role::Admin {
            errors.push(FieldError::new("role", "admin accounts cannot self-register"));
        }
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        let user = self.auth.sign_up(email.trim(), password, role).await?;
        info!("Account created for {} via {}", user.email, self.auth.backend_name());
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let session = self.auth.sign_in(email.trim(), password).await?;
        info!("Signed in as {}", session.user.email);
        self.current.send_replace(Some(session.user.clone()));
        Ok(session.user)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await?;
        self.current.send_replace(None);
        info!("Signed out");
        Ok(())
    }
}
