//! Sign-in, sign-up and password reset.

use serde_json::Value;

use super::types::{ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest};
use crate::credential::StoredCredential;
use crate::error::{ApiError, ApiResult};
use crate::request::{ApiClient, ApiRequest};

const LOGIN: &str = "/api/Auth/login";
const REGISTER: &str = "/api/Auth/register";
const FORGOT_PASSWORD: &str = "/api/Auth/forgot-password";

/// Authentication endpoints.
pub struct Auth<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    /// Authentication endpoints.
    #[must_use]
    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }
}

impl Auth<'_> {
    /// Signs in and stores the issued credential.
    ///
    /// # Errors
    ///
    /// * [`ApiError::Http`] - Wrong credentials or validation failure
    /// * [`ApiError::InvalidResponse`] - The backend answered without a token
    /// * [`ApiError::Storage`] - The credential could not be persisted
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.client.post(LOGIN, &req).await?;
        if response.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "login succeeded but no token was issued".to_string(),
            ));
        }

        let mut credential = StoredCredential::new(response.token.clone());
        credential.refresh_token.clone_from(&response.refresh_token);
        self.client.tokens().set_credential(&credential)?;

        tracing::info!(email, "Signed in");
        Ok(response)
    }

    /// Creates an account. The response body is returned as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`](crate::ApiError::Http) if the backend rejects the registration.
    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<Value> {
        self.client.post(REGISTER, req).await
    }

    /// Asks the backend to send a password reset email.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`](crate::ApiError::Http) if the backend rejects the request.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        let req = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.client
            .send(ApiRequest::post(FORGOT_PASSWORD).json(&req)?)
            .await?;
        Ok(())
    }

    /// Renews the session with the stored refresh token.
    ///
    /// Shares any attempt already in flight.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Refresh`] when no new credential was obtained. The
    /// stored credential is left as it was.
    pub async fn refresh(&self) -> ApiResult<String> {
        Ok(self.client.tokens().refresh_token().await?)
    }

    /// Signs out locally. The backend keeps no session to end.
    pub fn logout(&self) {
        self.client.tokens().clear_auth();
    }
}
