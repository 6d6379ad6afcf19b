//! Wire types of the hosted identity provider

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Session;
use crate::error::Error;
use crate::models::AuthUser;

/// Credentials sent to the sign-up and token endpoints
#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Authentication response
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// The user data
    pub user: Option<User>,

    /// The access token
    pub access_token: Option<String>,

    /// The refresh token
    pub refresh_token: Option<String>,

    /// The lifetime of the access token in seconds
    pub expires_in: Option<i64>,
}

impl AuthResponse {
    /// The session carried by this response, if tokens were issued
    pub fn session(&self) -> Option<Session> {
        let user = self.user.as_ref()?;
        let access_token = self.access_token.clone()?;
        Some(Session::new(
            access_token,
            self.refresh_token.clone().unwrap_or_default(),
            user.id.clone(),
            self.expires_in.unwrap_or(3600),
        ))
    }
}

/// User data as returned by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// The user ID
    pub id: String,

    /// The user's email address
    pub email: Option<String>,

    /// The user metadata
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,
}

impl TryFrom<User> for AuthUser {
    type Error = Error;

    fn try_from(user: User) -> Result<Self, Error> {
        let meta = |key: &str| {
            user.user_metadata
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let display_name = meta("display_name").or_else(|| meta("full_name"));
        let profile_image_url = meta("avatar_url");
        let email = user
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| Error::auth("Provider returned no email"))?;
        Ok(AuthUser {
            id: user.id,
            email,
            display_name,
            profile_image_url,
        })
    }
}
