//! Session management for authentication

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Session issued by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The user ID
    pub user_id: String,

    /// The token type
    pub token_type: String,

    /// The lifetime in seconds
    pub expires_in: i64,

    /// The expiry as a unix timestamp
    pub expires_at: Option<i64>,
}

impl Session {
    /// Create a new bearer session expiring `expires_in` seconds from now
    pub fn new(
        access_token: String,
        refresh_token: String,
        user_id: String,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            user_id,
            token_type: "bearer".to_string(),
            expires_in,
            expires_at: Some(Utc::now().timestamp() + expires_in),
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires_at| Utc::now().timestamp() >= expires_at)
            .unwrap_or(false)
    }
}

/// Session slot shared between the auth client and the remote store
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Arc<RwLock<Option<Session>>>);

impl SessionHandle {
    /// Get the current session
    pub fn get(&self) -> Option<Session> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the current session
    pub fn set(&self, session: Option<Session>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Access token of a live session
    pub fn access_token(&self) -> Option<String> {
        self.get()
            .filter(|session| !session.is_expired())
            .map(|session| session.access_token)
    }
}
