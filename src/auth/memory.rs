//! In-process identity provider

use std::collections::HashMap;

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use super::AuthProvider;
use crate::error::{Error, Result};
use crate::models::{new_id, AuthUser};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    user: AuthUser,
    password_hash: String,
}

/// Identity provider that keeps accounts in memory.
///
/// Passwords are stored as Argon2 hashes; emails are matched case-insensitively.
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    state: watch::Sender<Option<AuthUser>>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            state,
        }
    }

    fn sign_in_as(&self, user: &AuthUser) {
        self.state.send_replace(Some(user.clone()));
        tracing::info!(user_id = %user.id, "signed in");
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(Error::auth("The email address is badly formatted."));
    }
    Ok(email)
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::auth(format!("Could not hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::auth(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&email) {
            return Err(Error::auth(
                "The email address is already in use by another account.",
            ));
        }

        let user = AuthUser::new(new_id(), email.clone());
        let password_hash = hash_password(password)?;
        accounts.insert(
            email,
            Account {
                user: user.clone(),
                password_hash,
            },
        );
        drop(accounts);

        self.sign_in_as(&user);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = normalize_email(email)?;
        let accounts = self.accounts.lock().await;
        let user = accounts
            .get(&email)
            .filter(|account| verify_password(password, &account.password_hash))
            .map(|account| account.user.clone())
            .ok_or_else(|| Error::auth("Invalid login credentials"))?;
        drop(accounts);

        self.sign_in_as(&user);
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        let user = self.current_user().ok_or_else(|| Error::auth("Not logged in"))?;
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
