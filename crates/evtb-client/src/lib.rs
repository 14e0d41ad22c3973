//! # EVTB Client
//!
//! Client library for the EV and battery marketplace API.
//!
//! ## Features
//!
//! - **Token Management**: Persisted bearer credential, JWT expiry checks and single-flight refresh
//! - **Request Pipeline**: Bearer injection, JSON/multipart bodies and normalized errors
//! - **Session Guard**: Forced sign-out and one delayed login redirect on 401
//! - **Typed Endpoints**: Auth, products, favorites, orders, payments, reviews and notifications
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     ApiClient                        │
//! │   auth() products() orders() favorites() ...         │
//! ├──────────────────────────────────────────────────────┤
//! │  send(): url ─ bearer ─ body ─ status ─ message      │
//! │            │                        │                │
//! │            ▼                        ▼ 401            │
//! │     ┌──────────────┐        ┌───────────────┐        │
//! │     │ TokenManager │◄───────│ SessionGuard  │        │
//! │     └──────┬───────┘        └───────┬───────┘        │
//! │            ▼                        ▼                │
//! │     CredentialStore             Navigator            │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use evtb_client::{ApiClient, ClientConfig, NoopNavigator, ProductQuery};
//!
//! # async fn run() -> evtb_client::ApiResult<()> {
//! let client = ApiClient::from_config(&ClientConfig::load(), Arc::new(NoopNavigator))?;
//! client.auth().login("buyer@evtb.vn", "secret").await?;
//!
//! let products = client.products().list(&ProductQuery::default()).await?;
//! println!("{} listings", products.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
pub mod jwt;
pub mod messages;
pub mod request;
pub mod session;
pub mod storage;
pub mod token;

#[cfg(test)]
mod test_support;

pub use api::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, API_URL_ENV};
pub use credential::StoredCredential;
pub use error::{ApiError, ApiResult, RefreshError};
pub use jwt::{decode_claims, TokenClaims};
pub use request::{ApiClient, ApiClientBuilder, ApiRequest, RequestBody, ResponseBody};
pub use reqwest::Method;
pub use session::{
    Navigator, NoopNavigator, SessionGuard, DEFAULT_LOGIN_ROUTE, DEFAULT_REDIRECT_DELAY,
};
pub use storage::{CredentialStore, FileStore, MemoryStore};
pub use token::{
    AuthState, TokenManager, TokenRefresher, UnsupportedRefresher, DEFAULT_EXPIRY_WINDOW,
    DEFAULT_STORAGE_KEY,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
