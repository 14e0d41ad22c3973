//! Orders and payments.

use super::types::{CreateOrderRequest, CreatePaymentRequest, Listing, Order, PaymentResponse};
use crate::error::ApiResult;
use crate::request::ApiClient;

const ORDERS: &str = "/api/Order";
const PAYMENTS: &str = "/api/Payment";

/// Order endpoints.
pub struct Orders<'a> {
    client: &'a ApiClient,
}

/// Payment endpoints.
pub struct Payments<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    /// Order endpoints.
    #[must_use]
    pub fn orders(&self) -> Orders<'_> {
        Orders { client: self }
    }

    /// Payment endpoints.
    #[must_use]
    pub fn payments(&self) -> Payments<'_> {
        Payments { client: self }
    }
}

impl Orders<'_> {
    /// Lists the signed-in user's orders.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn list(&self) -> ApiResult<Vec<Order>> {
        let listing: Listing<Order> = self.client.get(ORDERS).await?;
        Ok(listing.into_vec())
    }

    /// Fetches one order.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get(&self, id: i64) -> ApiResult<Order> {
        self.client.get(&format!("{ORDERS}/{id}")).await
    }

    /// Places an order.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn create(&self, req: &CreateOrderRequest) -> ApiResult<Order> {
        let order: Order = self.client.post(ORDERS, req).await?;
        tracing::info!(order_id = order.id, product_id = req.product_id, "Order placed");
        Ok(order)
    }
}

impl Payments<'_> {
    /// Starts a payment. The result usually carries a checkout URL.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn create(&self, req: &CreatePaymentRequest) -> ApiResult<PaymentResponse> {
        self.client.post(PAYMENTS, req).await
    }

    /// Fetches a payment's current state.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get(&self, id: i64) -> ApiResult<PaymentResponse> {
        self.client.get(&format!("{PAYMENTS}/{id}")).await
    }
}
