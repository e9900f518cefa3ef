use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use tokentrack_api_types::{AuthResponse, LoginRequest, RegisterRequest};
use tokentrack_core::UserProfile;

use crate::backend::UsageBackend;
use crate::error::{ControllerError, LOGIN_FALLBACK, REGISTER_FALLBACK, server_message_or};
use crate::store::TokenStore;

/// Opaque bearer token issued by the server.
///
/// `Debug` shows only the length so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Trimmed token, or `None` when blank.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthToken(<{} chars>)", self.0.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Verifying,
    Authenticated,
}

/// Authenticated identity plus bearer token, or the absence thereof.
///
/// A token exists exactly when the session is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Verifying,
    Authenticated { token: AuthToken, user: UserProfile },
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Anonymous => SessionStatus::Anonymous,
            Self::Verifying => SessionStatus::Verifying,
            Self::Authenticated { .. } => SessionStatus::Authenticated,
        }
    }

    pub fn token(&self) -> Option<&AuthToken> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Sign-up form contents.
#[derive(Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Owns the token lifecycle and the authenticated identity.
///
/// The only writer of the token store and of the current [`Session`].
pub struct SessionManager<B, S> {
    backend: Arc<B>,
    store: S,
    session: RwLock<Session>,
}

impl<B: UsageBackend, S: TokenStore> SessionManager<B, S> {
    pub fn new(backend: Arc<B>, store: S) -> Self {
        Self {
            backend,
            store,
            session: RwLock::new(Session::Anonymous),
        }
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.read().expect("session lock poisoned").clone()
    }

    fn set_session(&self, session: Session) {
        *self.session.write().expect("session lock poisoned") = session;
    }

    /// Log in with email and password.
    ///
    /// On success the token is persisted and becomes the credential for
    /// every later authenticated call.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ControllerError> {
        let req = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let resp = self.backend.login(&req).await.map_err(|e| {
            warn!("Login failed: {e}");
            ControllerError::Auth(server_message_or(&e, LOGIN_FALLBACK))
        })?;
        self.establish(resp)
    }

    /// Create an account. The password confirmation is checked before any
    /// request is made.
    pub async fn register(&self, form: &Registration) -> Result<Session, ControllerError> {
        if form.password != form.confirm_password {
            return Err(ControllerError::Validation(
                "Passwords do not match".to_string(),
            ));
        }
        let req = RegisterRequest {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        let resp = self.backend.register(&req).await.map_err(|e| {
            warn!("Registration failed: {e}");
            ControllerError::Auth(server_message_or(&e, REGISTER_FALLBACK))
        })?;
        self.establish(resp)
    }

    fn establish(&self, resp: AuthResponse) -> Result<Session, ControllerError> {
        let token = AuthToken::parse(&resp.token)
            .ok_or_else(|| ControllerError::Auth("Server returned an empty token".to_string()))?;
        self.store.save(&token)?;
        info!(user_id = %resp.user.id, "Signed in");
        let session = Session::Authenticated {
            token,
            user: resp.user,
        };
        self.set_session(session.clone());
        Ok(session)
    }

    /// Restore the persisted token, if any, and verify it.
    pub async fn restore(&self) -> Session {
        match self.store.load() {
            Ok(Some(token)) => self.verify(token).await,
            Ok(None) => {
                debug!("No stored session token");
                self.set_session(Session::Anonymous);
                Session::Anonymous
            }
            Err(e) => {
                warn!("Could not read stored session token: {e}");
                self.set_session(Session::Anonymous);
                Session::Anonymous
            }
        }
    }

    /// Resolve `token` into a live profile.
    ///
    /// Any failure clears the stored token and leaves the session
    /// anonymous. Nothing is returned as an error.
    pub async fn verify(&self, token: AuthToken) -> Session {
        self.set_session(Session::Verifying);
        match self.backend.me(token.expose()).await {
            Ok(resp) => {
                info!(user_id = %resp.user.id, "Stored session verified");
                let session = Session::Authenticated {
                    token,
                    user: resp.user,
                };
                self.set_session(session.clone());
                session
            }
            Err(e) => {
                warn!("Token verification failed: {e}");
                self.discard();
                Session::Anonymous
            }
        }
    }

    /// Forget the token and profile. Safe to call when already signed out.
    pub fn logout(&self) {
        self.discard();
        info!("Signed out");
    }

    fn discard(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Could not remove stored session token: {e}");
        }
        self.set_session(Session::Anonymous);
    }
}
