//! The signed-in user's profile and notifications.

use super::types::{Listing, Notification, UserProfile};
use crate::error::ApiResult;
use crate::request::{ApiClient, ApiRequest};

/// Profile endpoints.
pub struct Users<'a> {
    client: &'a ApiClient,
}

/// Notification endpoints.
pub struct Notifications<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    /// Profile endpoints.
    #[must_use]
    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }

    /// Notification endpoints.
    #[must_use]
    pub fn notifications(&self) -> Notifications<'_> {
        Notifications { client: self }
    }
}

impl Users<'_> {
    /// Fetches the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`](crate::ApiError::Http) with status 401 when signed out.
    pub async fn me(&self) -> ApiResult<UserProfile> {
        self.client.get("/api/User/profile").await
    }
}

impl Notifications<'_> {
    /// Lists notifications, newest first as ordered by the backend.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn list(&self) -> ApiResult<Vec<Notification>> {
        let listing: Listing<Notification> = self.client.get("/api/Notification").await?;
        Ok(listing.into_vec())
    }

    /// Marks one notification as read.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn mark_read(&self, id: i64) -> ApiResult<()> {
        self.client
            .send(ApiRequest::put(format!("/api/Notification/{id}/read")))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::credential::StoredCredential;
    use crate::request::ApiClient;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signed_in(server: &MockServer) -> ApiClient {
        let client = ApiClient::builder(server.uri()).build().unwrap();
        client
            .tokens()
            .set_credential(&StoredCredential::new("abc"))
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_me() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/User/profile"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "userId": 4,
                "fullName": "Trần Thị B",
                "creditBalance": 12.5
            })))
            .mount(&server)
            .await;

        let me = signed_in(&server).users().me().await.unwrap();

        assert_eq!(me.id, 4);
        assert_eq!(me.full_name.as_deref(), Some("Trần Thị B"));
        assert_eq!(me.credit_balance, Some(12.5));
    }

    #[tokio::test]
    async fn test_notifications_wrapped_listing_and_mark_read() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Notification"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "notificationId": 1, "title": "Đơn hàng mới", "isRead": false },
                    { "notificationId": 2, "isRead": true }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/Notification/1/read"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in(&server);
        let list = client.notifications().list().await.unwrap();

        assert_eq!(list.len(), 2);
        assert!(!list[0].is_read);
        assert!(list[1].is_read);

        client.notifications().mark_read(1).await.unwrap();
    }
}
