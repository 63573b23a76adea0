use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ClientError;
use crate::gateway::{ApiRequest, Gateway};
use crate::session::store::SharedStore;

/// Login response fields that may carry the token, checked in this order
pub const TOKEN_FIELDS: [&str; 3] = ["token", "access", "auth_token"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Outcome of the protected-view gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allow,
    RedirectToLogin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Pull the session token out of a login response body
pub fn extract_token(body: &Value) -> Option<String> {
    TOKEN_FIELDS.iter().find_map(|field| {
        body.get(*field)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

/// Login, logout and the protected-view gate.
///
/// State is never held here: Anonymous/Authenticated is read straight from the store.
#[derive(Debug, Clone)]
pub struct SessionController {
    users: Gateway,
    store: SharedStore,
}

impl SessionController {
    /// `users` must be the user-service Gateway; `store` the one it reads from
    pub fn new(users: Gateway, store: SharedStore) -> Self {
        Self { users, store }
    }

    pub fn state(&self) -> SessionState {
        match self.store.get() {
            Some(_) => SessionState::Authenticated,
            None => SessionState::Anonymous,
        }
    }

    pub fn require_authenticated(&self) -> Gate {
        match self.state() {
            SessionState::Authenticated => Gate::Allow,
            SessionState::Anonymous => Gate::RedirectToLogin,
        }
    }

    /// Exchange credentials for a token and persist it.
    ///
    /// The request is sent without credentials whatever the store holds. On any
    /// failure the store is left exactly as it was.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ClientError> {
        let payload = serde_json::to_value(credentials)
            .map_err(|e| ClientError::InvalidPayload(e.to_string()))?;

        let response = self
            .users
            .send(ApiRequest::post("/login/").json(payload).anonymous())
            .await?;

        let token = extract_token(&response.body).ok_or(ClientError::MissingToken)?;
        self.store.set(&token)?;

        info!(email = %credentials.email, "Logged in");
        Ok(())
    }

    /// Create an account; no credentials attached
    pub async fn register(&self, payload: Value) -> Result<Value, ClientError> {
        let response = self
            .users
            .send(ApiRequest::post("/register/").json(payload).anonymous())
            .await?;
        Ok(response.body)
    }

    /// Revoke the token remotely, then clear it locally no matter what happened.
    ///
    /// A remote failure is still returned, after the store has been cleared.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let remote = if self.store.get().is_some() {
            self.users.send(ApiRequest::post("/logout/")).await.map(|_| ())
        } else {
            Ok(())
        };

        self.store.clear()?;

        match remote {
            Ok(()) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!("Remote logout failed, local session cleared anyway: {}", e);
                Err(e)
            }
        }
    }
}
