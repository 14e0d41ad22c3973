//! # API Types
//!
//! Request and response bodies of the marketplace REST API. The backend
//! speaks camelCase JSON; optional fields default so that partial
//! payloads from older endpoints still parse.

use serde::{Deserialize, Serialize};

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token.
    #[serde(alias = "accessToken")]
    pub token: String,
    /// Refresh token, if issued.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Profile of the signed-in user, if the backend includes it.
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// New account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Full name.
    pub full_name: String,
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Password reset request.
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    /// Account email.
    pub email: String,
}

/// A user's profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User ID.
    #[serde(alias = "userId")]
    pub id: i64,
    /// Full name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Email.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Role name (`Member`, `Admin`, ...).
    #[serde(default)]
    pub role: Option<String>,
    /// Remaining posting credits.
    #[serde(default)]
    pub credit_balance: Option<f64>,
}

/// Image attached to a listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    /// Image ID.
    #[serde(alias = "imageId")]
    pub id: i64,
    /// Public URL.
    #[serde(alias = "imageData", alias = "url")]
    pub image_url: String,
}

/// A marketplace listing (vehicle or battery).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    #[serde(alias = "productId")]
    pub id: i64,
    /// Listing title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Asking price in VND.
    #[serde(default)]
    pub price: f64,
    /// `Vehicle` or `Battery`.
    #[serde(default)]
    pub product_type: Option<String>,
    /// Brand.
    #[serde(default)]
    pub brand: Option<String>,
    /// Model.
    #[serde(default)]
    pub model: Option<String>,
    /// Manufacture year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Battery capacity in kWh.
    #[serde(default)]
    pub battery_capacity: Option<f64>,
    /// Moderation status (`Pending`, `Approved`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Seller's user ID.
    #[serde(default)]
    pub seller_id: Option<i64>,
    /// Images.
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Creation time as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Listing filters. Unset fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Free-text search.
    pub search: Option<String>,
    /// `Vehicle` or `Battery`.
    pub product_type: Option<String>,
    /// Minimum price.
    pub min_price: Option<f64>,
    /// Maximum price.
    pub max_price: Option<f64>,
    /// 1-based page.
    pub page: Option<u32>,
    /// Page size.
    pub page_size: Option<u32>,
}

impl ProductQuery {
    /// Query parameters for the set filters.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(kind) = &self.product_type {
            pairs.push(("productType", kind.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        pairs
    }
}

/// Fields for creating or updating a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    /// Listing title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Asking price in VND.
    pub price: f64,
    /// `Vehicle` or `Battery`.
    pub product_type: String,
    /// Brand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Manufacture year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Battery capacity in kWh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_capacity: Option<f64>,
}

/// An order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order ID.
    #[serde(alias = "orderId")]
    pub id: i64,
    /// Ordered product.
    #[serde(default)]
    pub product_id: Option<i64>,
    /// Buyer's user ID.
    #[serde(default)]
    pub buyer_id: Option<i64>,
    /// Seller's user ID.
    #[serde(default)]
    pub seller_id: Option<i64>,
    /// Total in VND.
    #[serde(default)]
    pub total_amount: Option<f64>,
    /// Server-side status (`Pending`, `Approved`, `Completed`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Creation time as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// New order for a product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Product to buy.
    pub product_id: i64,
    /// Note for the seller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// New payment (order deposit or credit purchase).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Order being paid, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    /// Amount in VND.
    pub amount: f64,
    /// `Deposit`, `FinalPayment`, `Credit`, ...
    pub payment_type: String,
}

/// A payment as seen by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    /// Payment ID.
    #[serde(alias = "paymentId")]
    pub id: i64,
    /// Status.
    #[serde(default)]
    pub status: Option<String>,
    /// Amount in VND.
    #[serde(default)]
    pub amount: Option<f64>,
    /// Gateway checkout URL the user must visit.
    #[serde(default, alias = "checkoutUrl")]
    pub payment_url: Option<String>,
}

/// A favorited listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Favorite ID.
    #[serde(alias = "favoriteId")]
    pub id: i64,
    /// Favorited product.
    pub product_id: i64,
    /// Product details, when embedded.
    #[serde(default)]
    pub product: Option<Product>,
    /// When it was added.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A rating left on a product or seller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review ID.
    #[serde(alias = "reviewId")]
    pub id: i64,
    /// Reviewed product.
    #[serde(default)]
    pub product_id: Option<i64>,
    /// Author's user ID.
    #[serde(default)]
    pub reviewer_id: Option<i64>,
    /// Stars, 1 to 5.
    pub rating: u8,
    /// Free text.
    #[serde(default)]
    pub content: Option<String>,
    /// Creation time as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// New review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    /// Reviewed product.
    pub product_id: i64,
    /// Stars, 1 to 5.
    pub rating: u8,
    /// Free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A notification for the signed-in user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID.
    #[serde(alias = "notificationId")]
    pub id: i64,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Body text.
    #[serde(default)]
    pub content: Option<String>,
    /// Whether it has been read.
    #[serde(default)]
    pub is_read: bool,
    /// Creation time as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// List payloads come either bare or wrapped in `data` / `items`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Data { data: Vec<T> },
    Items { items: Vec<T> },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Data { data: items } | Listing::Items { items } => {
                items
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_parses_with_aliases_and_defaults() {
        let product: Product = serde_json::from_value(json!({
            "productId": 3,
            "title": "VinFast VF e34",
            "price": 450000000.0,
            "productType": "Vehicle",
            "images": [{ "imageId": 1, "imageData": "https://cdn/x.jpg" }]
        }))
        .unwrap();

        assert_eq!(product.id, 3);
        assert_eq!(product.product_type.as_deref(), Some("Vehicle"));
        assert_eq!(product.images[0].image_url, "https://cdn/x.jpg");
        assert!(product.status.is_none());
    }

    #[test]
    fn test_listing_shapes() {
        let bare: Listing<i64> = serde_json::from_value(json!([1, 2])).unwrap();
        let data: Listing<i64> = serde_json::from_value(json!({ "data": [3] })).unwrap();
        let items: Listing<i64> =
            serde_json::from_value(json!({ "items": [4], "total": 1 })).unwrap();

        assert_eq!(bare.into_vec(), vec![1, 2]);
        assert_eq!(data.into_vec(), vec![3]);
        assert_eq!(items.into_vec(), vec![4]);
    }

    #[test]
    fn test_product_query_pairs_skip_unset() {
        let query = ProductQuery {
            search: Some("pin lithium".into()),
            page: Some(2),
            ..ProductQuery::default()
        };

        assert_eq!(
            query.to_pairs(),
            vec![("search", "pin lithium".to_string()), ("page", "2".to_string())]
        );
    }

    #[test]
    fn test_register_request_is_camel_case() {
        let req = RegisterRequest {
            full_name: "Nguyễn Văn A".into(),
            email: "a@b.vn".into(),
            password: "secret".into(),
            phone: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["fullName"], "Nguyễn Văn A");
        assert!(value.get("phone").is_none());
    }
}
