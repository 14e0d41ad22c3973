//! # Token Manager
//!
//! Owns the persisted credential: reading and writing it, judging the
//! bearer token's apparent freshness, and coalescing refresh attempts.
//!
//! Expiry checks are fail-open. A token whose payload cannot be decoded, or
//! that carries no `exp`, is treated as not expired; the backend's 401 is
//! the authority on whether a token is still good.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::{watch, Mutex};

use crate::clock::{Clock, SystemClock};
use crate::credential::StoredCredential;
use crate::error::{ApiError, ApiResult, RefreshError};
use crate::jwt::{self, TokenClaims};
use crate::storage::CredentialStore;

/// Storage key holding the credential blob.
pub const DEFAULT_STORAGE_KEY: &str = "evtb_auth";

/// How close to expiry a token counts as "expiring soon".
pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Whether a credential is currently stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No credential stored.
    Unauthenticated,
    /// A credential is stored (it may still be rejected by the backend).
    Authenticated,
}

/// Exchanges a refresh token for a new credential.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Performs one refresh round-trip.
    async fn refresh(&self, refresh_token: String) -> Result<StoredCredential, RefreshError>;
}

/// Refresher for backends without a refresh endpoint. Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedRefresher;

#[async_trait]
impl TokenRefresher for UnsupportedRefresher {
    async fn refresh(&self, _refresh_token: String) -> Result<StoredCredential, RefreshError> {
        Err(RefreshError::Unsupported)
    }
}

type RefreshFlight = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

/// Session credential owner shared by every request-making component.
///
/// Construct one per session and hand it around in an [`Arc`].
pub struct TokenManager {
    store: Arc<dyn CredentialStore>,
    key: String,
    clock: Arc<dyn Clock>,
    expiry_window: Duration,
    refresher: Arc<dyn TokenRefresher>,
    in_flight: Mutex<Option<RefreshFlight>>,
    refresh_attempts: AtomicU64,
    state: Arc<watch::Sender<AuthState>>,
    // Serializes credential writes. Bumped on every set and clear so that a
    // refresh started before a logout or a new login does not write back.
    generation: Arc<parking_lot::Mutex<u64>>,
}

impl TokenManager {
    /// Creates a manager over `store` with the default key, wall clock, a
    /// five minute expiry window and no refresh support.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        let manager = Self {
            store,
            key: DEFAULT_STORAGE_KEY.to_string(),
            clock: Arc::new(SystemClock),
            expiry_window: DEFAULT_EXPIRY_WINDOW,
            refresher: Arc::new(UnsupportedRefresher),
            in_flight: Mutex::new(None),
            refresh_attempts: AtomicU64::new(0),
            state: Arc::new(state),
            generation: Arc::new(parking_lot::Mutex::new(0)),
        };
        manager.sync();
        manager
    }

    /// Uses a different storage key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self.sync();
        self
    }

    /// Uses a different time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Uses a different "expiring soon" window.
    #[must_use]
    pub fn with_expiry_window(mut self, window: Duration) -> Self {
        self.expiry_window = window;
        self
    }

    /// Installs a refresher.
    #[must_use]
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    /// Returns the storage key in use.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Reads the stored credential.
    ///
    /// Missing, unreadable and corrupt values all yield `None`.
    #[must_use]
    pub fn get_credential(&self) -> Option<StoredCredential> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read stored credential");
                return None;
            }
        };

        match serde_json::from_str::<StoredCredential>(&raw) {
            Ok(credential) if !credential.token.is_empty() => Some(credential),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Stored credential is corrupt, ignoring");
                None
            }
        }
    }

    /// Returns the stored bearer token.
    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        self.get_credential().map(|c| c.token)
    }

    /// Persists a credential, replacing any previous one.
    ///
    /// # Errors
    ///
    /// * [`ApiError::InvalidRequest`] - The credential has an empty token
    /// * [`ApiError::Storage`] - The store rejects the write
    pub fn set_credential(&self, credential: &StoredCredential) -> ApiResult<()> {
        if credential.token.is_empty() {
            return Err(ApiError::InvalidRequest(
                "refusing to store a credential with an empty token".to_string(),
            ));
        }
        let raw = serde_json::to_string(credential)?;

        let mut generation = self.generation.lock();
        self.store.set(&self.key, &raw)?;
        *generation += 1;
        self.state.send_replace(AuthState::Authenticated);
        drop(generation);

        tracing::info!("Stored new credential");
        Ok(())
    }

    /// Deletes the stored credential. Calling it again is harmless.
    pub fn clear_auth(&self) {
        let mut generation = self.generation.lock();
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "Failed to remove stored credential");
        }
        *generation += 1;
        let previous = self.state.send_replace(AuthState::Unauthenticated);
        drop(generation);

        if previous == AuthState::Authenticated {
            tracing::info!("Cleared stored credential");
        }
    }

    /// Decoded claims of the stored token.
    #[must_use]
    pub fn claims(&self) -> Option<TokenClaims> {
        self.get_token().and_then(|t| jwt::decode_claims(&t))
    }

    /// Returns whether `token` has passed its `exp`. Undecodable tokens are not expired.
    #[must_use]
    pub fn is_token_expired(&self, token: &str) -> bool {
        match expiry_of(token) {
            Some(exp) => exp <= self.clock.now().timestamp(),
            None => false,
        }
    }

    /// Returns whether `token` expires within the configured window.
    #[must_use]
    pub fn is_token_expiring_soon(&self, token: &str) -> bool {
        self.is_token_expiring_within(token, self.expiry_window)
    }

    /// Returns whether `token` expires within `window`. Expired tokens count.
    #[must_use]
    pub fn is_token_expiring_within(&self, token: &str, window: Duration) -> bool {
        let Some(exp) = expiry_of(token) else {
            return false;
        };
        let window = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
        exp.saturating_sub(self.clock.now().timestamp()) <= window
    }

    /// Returns the token to send with a request.
    ///
    /// An expiring token is refreshed first when a refresh token is stored.
    /// The stored token is returned even when it looks expired.
    pub async fn get_valid_token(&self) -> Option<String> {
        let credential = self.get_credential()?;

        if self.is_token_expiring_soon(&credential.token) {
            if credential.refresh_token.is_some() {
                match self.refresh_token().await {
                    Ok(token) => return Some(token),
                    Err(e) => {
                        tracing::debug!(error = %e, "Token refresh failed, using stored token");
                    }
                }
            } else if self.is_token_expired(&credential.token) {
                tracing::debug!("Stored token looks expired, sending it anyway");
            }
        }

        Some(credential.token)
    }

    /// Exchanges the stored refresh token for a new credential.
    ///
    /// Concurrent callers share one attempt and all see its outcome. The
    /// slot is released when the attempt settles.
    ///
    /// # Errors
    ///
    /// Returns the [`RefreshError`] produced by the shared attempt.
    pub async fn refresh_token(&self) -> Result<String, RefreshError> {
        let flight = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let flight = self.start_refresh();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        let outcome = flight.clone().await;

        {
            let mut slot = self.in_flight.lock().await;
            if slot.as_ref().is_some_and(|f| f.ptr_eq(&flight)) {
                *slot = None;
            }
        }

        outcome
    }

    /// Number of refresh attempts started (coalesced callers are not counted).
    #[must_use]
    pub fn refresh_attempts(&self) -> u64 {
        self.refresh_attempts.load(Ordering::Relaxed)
    }

    /// Current auth state.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        *self.state.borrow()
    }

    /// Subscribes to auth state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Re-reads the store and publishes the state if it changed.
    ///
    /// Another process sharing the store may have logged in or out.
    pub fn sync(&self) -> bool {
        let next = if self.get_credential().is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    fn start_refresh(&self) -> RefreshFlight {
        self.refresh_attempts.fetch_add(1, Ordering::Relaxed);

        let started_at = *self.generation.lock();
        let refresh_token = self.get_credential().and_then(|c| c.refresh_token);
        let refresher = Arc::clone(&self.refresher);
        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);

        async move {
            let refresh_token = refresh_token.ok_or(RefreshError::MissingRefreshToken)?;
            let credential = refresher.refresh(refresh_token).await?;
            if credential.token.is_empty() {
                return Err(RefreshError::Failed(
                    "refresh returned an empty token".to_string(),
                ));
            }

            let raw = serde_json::to_string(&credential)
                .map_err(|e| RefreshError::Failed(e.to_string()))?;

            let mut current = generation.lock();
            if *current != started_at {
                tracing::debug!("Credential changed during refresh, discarding result");
                return Err(RefreshError::Superseded);
            }
            store
                .set(&key, &raw)
                .map_err(|e| RefreshError::Failed(e.to_string()))?;
            *current += 1;
            state.send_replace(AuthState::Authenticated);
            drop(current);
            tracing::info!("Refreshed credential");

            Ok(credential.token)
        }
        .boxed()
        .shared()
    }
}

fn expiry_of(token: &str) -> Option<i64> {
    let exp = jwt::decode_claims(token).and_then(|c| c.exp());
    if exp.is_none() {
        tracing::trace!("Token expiry unknown, treating as valid");
    }
    exp
}
