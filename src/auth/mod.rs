//! Authentication and user management

mod memory;
mod session;
mod types;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::watch;

use crate::config::{ClientOptions, JournyConfig};
use crate::error::{Error, Result};
use crate::fetch::{provider_message, status_error, Fetch};
use crate::models::AuthUser;

pub use memory::MemoryAuth;
pub use session::*;
pub use types::{AuthResponse, User};

use types::Credentials;

/// An identity provider with email and password accounts
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register a new account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Sign out the current user; `Auth("Not logged in")` without a session
    async fn sign_out(&self) -> Result<()>;

    /// The signed-in user, if any
    fn current_user(&self) -> Option<AuthUser>;

    /// Receiver that observes every sign-in and sign-out
    fn on_state_change(&self) -> watch::Receiver<Option<AuthUser>>;
}

/// Client for the hosted identity provider
pub struct Auth {
    url: String,
    key: String,
    client: Client,
    session: SessionHandle,
    state: watch::Sender<Option<AuthUser>>,
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client writing its session into `session`
    pub fn new(
        config: &JournyConfig,
        client: Client,
        session: SessionHandle,
        options: ClientOptions,
    ) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            url: config.base_url(),
            key: config.api_key.clone(),
            client,
            session,
            state,
            options,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    async fn request_token(
        &self,
        path: &str,
        grant_type: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse> {
        let url = self.get_auth_url(path);
        let mut builder = Fetch::post(&self.client, &url).header("apikey", &self.key);
        if let Some(grant_type) = grant_type {
            builder = builder.query("grant_type", grant_type);
        }
        let response = builder
            .json(&Credentials { email, password })?
            .execute_raw()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<AuthResponse>().await?);
        }
        let text = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            // rejected credentials come back as 400 or 422 as well as 401
            return Err(Error::Auth(provider_message(&text)));
        }
        Err(status_error(status, text))
    }

    fn establish(&self, response: AuthResponse) -> Result<AuthUser> {
        let session = response.session();
        let user: AuthUser = response
            .user
            .ok_or_else(|| Error::auth("Provider returned no user"))?
            .try_into()?;
        if self.options.persist_session {
            self.session.set(session);
        }
        self.state.send_replace(Some(user.clone()));
        tracing::info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        self.session.get()
    }

    /// Set the session
    pub fn set_session(&self, session: Session) {
        self.session.set(Some(session));
    }

    /// Handle to the session slot, for clients that authorize with it
    pub fn session_handle(&self) -> SessionHandle {
        self.session.clone()
    }
}

#[async_trait]
impl AuthProvider for Auth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let response = self.request_token("/signup", None, email, password).await?;
        if response.access_token.is_none() {
            // accounts created without tokens still have to sign in
            return self.sign_in(email, password).await;
        }
        self.establish(response)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let response = self
            .request_token("/token", Some("password"), email, password)
            .await?;
        self.establish(response)
    }

    async fn sign_out(&self) -> Result<()> {
        let user = self.current_user().ok_or_else(|| Error::auth("Not logged in"))?;

        if let Some(token) = self.session.get().map(|s| s.access_token) {
            let url = self.get_auth_url("/logout");
            Fetch::post(&self.client, &url)
                .header("apikey", &self.key)
                .bearer_auth(&token)
                .execute_empty()
                .await?;
        }

        self.session.set(None);
        self.state.send_replace(None);
        tracing::info!(user_id = %user.id, "signed out");
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    fn on_state_change(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }
}
