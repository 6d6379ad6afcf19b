//! Journy data layer
//!
//! Trips with their expenses, flights, stays and activities, stored per user
//! in a versioned document store, plus email/password accounts and live trip
//! subscriptions. Backends can be the hosted HTTP services or in-process ones.

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod mapper;
pub mod models;
pub mod profiles;
pub mod realtime;
pub mod storage;
pub mod store;
pub mod trips;

use std::sync::Arc;

use reqwest::Client;

use crate::auth::{Auth, AuthProvider, MemoryAuth, SessionHandle};
use crate::config::{ClientOptions, JournyConfig};
use crate::error::{Error, Result};
use crate::models::AuthUser;
use crate::profiles::ProfileStore;
use crate::storage::{MemoryObjectStore, ObjectStore, StorageClient};
use crate::store::{DocumentStore, MemoryStore, RestStore};
use crate::trips::TripStore;

/// The main entry point: accounts, profiles and trips over one pair of
/// backends
pub struct Journy {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    options: ClientOptions,
}

impl Journy {
    /// Create a client for the hosted services
    ///
    /// # Example
    ///
    /// ```
    /// use journy::Journy;
    ///
    /// let journy = Journy::new("https://api.example.com", "public-key").unwrap();
    /// assert!(journy.current_user().is_none());
    /// ```
    pub fn new(url: &str, api_key: &str) -> Result<Self> {
        Self::new_with_options(url, api_key, ClientOptions::default())
    }

    /// Create a client for the hosted services with custom options
    pub fn new_with_options(url: &str, api_key: &str, options: ClientOptions) -> Result<Self> {
        Self::from_config(&JournyConfig::new(url, api_key.to_string())?, options)
    }

    /// Create a client from `JOURNY_*` environment variables
    pub fn from_env() -> Result<Self> {
        let options = ClientOptions::default().with_env_overrides()?;
        Self::from_config(&JournyConfig::from_env()?, options)
    }

    pub fn from_config(config: &JournyConfig, options: ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let session = SessionHandle::default();
        let auth = Auth::new(config, http_client.clone(), session.clone(), options.clone());
        let store = RestStore::new(config, http_client.clone(), session.clone(), &options);
        let objects = StorageClient::new(config, http_client, session, &options.storage_bucket);
        Ok(Self::with_backends(
            Arc::new(auth),
            Arc::new(store),
            Arc::new(objects),
            options,
        ))
    }

    /// Client with in-process accounts and storage
    ///
    /// # Example
    ///
    /// ```
    /// # tokio_test::block_on(async {
    /// use journy::Journy;
    ///
    /// let journy = Journy::in_memory();
    /// let user = journy.sign_up("a@b.com", "secret1").await.unwrap();
    /// assert_eq!(journy.trips().unwrap().user_id(), user.id);
    /// # })
    /// ```
    pub fn in_memory() -> Self {
        Self::with_backends(
            Arc::new(MemoryAuth::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryObjectStore::new()),
            ClientOptions::default(),
        )
    }

    pub fn with_backends(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        options: ClientOptions,
    ) -> Self {
        Self {
            auth,
            store,
            objects,
            options,
        }
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub fn objects(&self) -> Arc<dyn ObjectStore> {
        self.objects.clone()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Register an account, sign it in and save its profile
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let user = self.auth.sign_up(email, password).await?;
        self.profiles().update_profile(&user).await?;
        Ok(user)
    }

    /// Sign in and load the saved profile, falling back to what the identity
    /// provider knows when there is none
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let user = self.auth.sign_in(email, password).await?;
        match self.profiles().fetch_profile(&user.id).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Ok(user),
            Err(Error::Decode(error)) => {
                tracing::warn!(user_id = %user.id, %error, "ignoring unreadable profile");
                Ok(user)
            }
            Err(error) => Err(error),
        }
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user()
    }

    /// Trips of the signed-in user
    pub fn trips(&self) -> Result<TripStore> {
        let user = self.current_user().ok_or_else(|| Error::auth("Not logged in"))?;
        self.trips_for(&user.id)
    }

    /// Trips of any user
    pub fn trips_for(&self, user_id: &str) -> Result<TripStore> {
        TripStore::new(self.store.clone(), user_id, &self.options)
    }

    pub fn profiles(&self) -> ProfileStore {
        ProfileStore::new(self.store.clone()).with_objects(self.objects.clone())
    }

    /// Replace the signed-in user's profile picture, returning its public URL
    pub async fn upload_profile_image(&self, jpeg: Vec<u8>) -> Result<String> {
        let user = self.current_user().ok_or_else(|| Error::auth("Not logged in"))?;
        self.profiles().upload_profile_image(&user.id, jpeg).await
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::AuthProvider;
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, Result};
    pub use crate::mapper::Decoded;
    pub use crate::models::{Accommodation, Activity, AuthUser, Expense, FlightInfo, Trip};
    pub use crate::realtime::TripSubscription;
    pub use crate::trips::TripStore;
    pub use crate::Journy;
}
