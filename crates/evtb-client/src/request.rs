//! # API Client
//!
//! HTTP client for the marketplace backend.
//!
//! Every call goes through [`ApiClient::send`], which decides whether to
//! attach the bearer token, encodes the body, and turns non-2xx responses
//! into [`ApiError::Http`] with a message fit for the end user. A 401 on a
//! protected endpoint ends the session via [`SessionGuard`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::messages;
use crate::session::{Navigator, NoopNavigator, SessionGuard};
use crate::storage::{CredentialStore, FileStore, MemoryStore};
use crate::token::TokenManager;

/// Body of an outgoing request.
#[derive(Debug)]
pub enum RequestBody {
    /// JSON document, sent as `application/json`.
    Json(Value),
    /// Multipart form, for file uploads.
    Multipart(Form),
}

/// One request to the backend.
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    headers: HeaderMap,
}

impl ApiRequest {
    /// Creates a request without a body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Serializes `body` as the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Serialization`] if `body` cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Uses an already-built JSON payload.
    #[must_use]
    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Sends a multipart form instead of JSON.
    #[must_use]
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Sets a header, overriding anything the client would set itself.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The request path as given.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The body parsed as JSON.
    Json(Value),
    /// A non-empty body that is not JSON.
    Text(String),
    /// No body.
    Empty,
}

impl ResponseBody {
    fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    /// Converts to a JSON value: text becomes a string, empty becomes `null`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => Value::String(text),
            ResponseBody::Empty => Value::Null,
        }
    }

    /// Deserializes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidResponse`] if the body does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> ApiResult<T> {
        serde_json::from_value(self.into_value())
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// HTTP client for the marketplace API.
///
/// Cheap to clone; clones share the HTTP connection pool, the token
/// manager and the session guard.
///
/// # Examples
///
/// ```rust,ignore
/// use evtb_client::{ApiClient, ClientConfig, NoopNavigator};
/// use std::sync::Arc;
///
/// let client = ApiClient::from_config(&ClientConfig::load(), Arc::new(NoopNavigator))?;
/// let products = client.products().list(&Default::default()).await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    tokens: Arc<TokenManager>,
    session: SessionGuard,
    auth_endpoints: Vec<String>,
}

impl ApiClient {
    /// Starts building a client for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(base_url)
    }

    /// Builds a client from configuration, with a file-backed credential store.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] for invalid settings and
    /// [`ApiError::Network`] if the HTTP client cannot be created.
    pub fn from_config(config: &ClientConfig, navigator: Arc<dyn Navigator>) -> ApiResult<Self> {
        config.validate()?;

        let store = match &config.storage_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::default_location()?,
        };
        let tokens = TokenManager::new(Arc::new(store))
            .with_storage_key(config.storage_key.clone())
            .with_expiry_window(config.expiry_window());

        Self::builder(config.api_url.clone())
            .timeout(config.timeout())
            .tokens(Arc::new(tokens))
            .navigator(navigator)
            .login_route(config.login_route.clone())
            .redirect_delay(config.redirect_delay())
            .auth_endpoints(config.auth_endpoints.clone())
            .build()
    }

    /// Returns the configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session's token manager.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// The session guard handling 401s.
    #[must_use]
    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    /// Returns whether `path` is a login/register/forgot-password endpoint.
    #[must_use]
    pub fn is_auth_endpoint(&self, path: &str) -> bool {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        self.auth_endpoints
            .iter()
            .any(|marker| path.contains(&marker.to_ascii_lowercase()))
    }

    /// Resolves `path` against the base URL. Absolute URLs pass through.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Sends one request and normalizes the outcome.
    ///
    /// # Errors
    ///
    /// * [`ApiError::Network`] - The request never got a response
    /// * [`ApiError::Http`] - The backend answered with a non-2xx status
    /// * [`ApiError::InvalidRequest`] - The stored token cannot be sent as a header
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ResponseBody> {
        let url = self.url_for(&request.path);
        let auth_endpoint = self.is_auth_endpoint(&request.path);

        let mut headers = HeaderMap::new();
        if !matches!(request.body, Some(RequestBody::Multipart(_))) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let mut authenticated = false;
        if !auth_endpoint {
            if let Some(token) = self.tokens.get_valid_token().await {
                let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    ApiError::InvalidRequest("stored token is not a valid header value".to_string())
                })?;
                headers.insert(AUTHORIZATION, value);
                authenticated = true;
            }
        }

        for (name, value) in &request.headers {
            headers.insert(name.clone(), value.clone());
        }

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Multipart(form)) => builder.multipart(form),
            None => builder,
        };

        tracing::debug!(method = %request.method, %url, authenticated, "Sending request");

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %request.method, %url, error = %e, "Request failed to send");
            ApiError::Network(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(ResponseBody::from_text(text));
        }

        let data = error_data(text);
        let message = messages::message_for(status.as_u16(), &data);
        tracing::warn!(
            method = %request.method,
            %url,
            status = status.as_u16(),
            %message,
            "Request returned an error"
        );

        if status == StatusCode::UNAUTHORIZED && !auth_endpoint {
            self.session.handle_unauthorized();
        }

        Err(ApiError::Http {
            status: status.as_u16(),
            message,
            data,
        })
    }

    /// `GET path`, deserializing the response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also [`ApiError::InvalidResponse`] if the body does not match `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(ApiRequest::get(path)).await?.deserialize()
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post(path).json(body)?)
            .await?
            .deserialize()
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::put(path).json(body)?)
            .await?
            .deserialize()
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::patch(path).json(body)?)
            .await?
            .deserialize()
    }

    /// `DELETE path`, discarding any response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(ApiRequest::delete(path)).await?;
        Ok(())
    }
}

/// Error bodies: JSON when possible, else the raw text, `null` when empty.
fn error_data(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
    tokens: Option<Arc<TokenManager>>,
    navigator: Arc<dyn Navigator>,
    login_route: Option<String>,
    redirect_delay: Option<Duration>,
    auth_endpoints: Vec<String>,
}

impl ApiClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        let defaults = ClientConfig::default();
        Self {
            base_url: base_url.into(),
            timeout: defaults.timeout(),
            tokens: None,
            navigator: Arc::new(NoopNavigator),
            login_route: None,
            redirect_delay: None,
            auth_endpoints: defaults.auth_endpoints,
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shares an existing token manager.
    #[must_use]
    pub fn tokens(mut self, tokens: Arc<TokenManager>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Uses a fresh token manager over `store`.
    #[must_use]
    pub fn store(self, store: Arc<dyn CredentialStore>) -> Self {
        self.tokens(Arc::new(TokenManager::new(store)))
    }

    /// Front-end routing used for the login redirect.
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Login route for the redirect.
    #[must_use]
    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = Some(route.into());
        self
    }

    /// Grace period before the redirect.
    #[must_use]
    pub fn redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = Some(delay);
        self
    }

    /// Path fragments marking unauthenticated auth endpoints.
    #[must_use]
    pub fn auth_endpoints(mut self, markers: Vec<String>) -> Self {
        self.auth_endpoints = markers;
        self
    }

    /// Builds the client. Without a token manager, credentials live in memory.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be created.
    pub fn build(self) -> ApiResult<ApiClient> {
        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("evtb-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let tokens = self
            .tokens
            .unwrap_or_else(|| Arc::new(TokenManager::new(Arc::new(MemoryStore::new()))));

        let mut session = SessionGuard::new(Arc::clone(&tokens), self.navigator);
        if let Some(route) = self.login_route {
            session = session.with_login_route(route);
        }
        if let Some(delay) = self.redirect_delay {
            session = session.with_delay(delay);
        }

        Ok(ApiClient {
            base_url: self.base_url,
            http,
            tokens,
            session,
            auth_endpoints: self.auth_endpoints,
        })
    }
}
