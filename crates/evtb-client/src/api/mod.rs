//! # Marketplace Endpoints
//!
//! Typed views over the REST resources, each borrowed from an
//! [`ApiClient`](crate::ApiClient):
//!
//! ```rust,ignore
//! let session = client.auth().login("a@b.vn", "secret").await?;
//! let favorites = client.favorites().list().await?;
//! ```

mod account;
mod auth;
mod orders;
mod products;
mod types;

pub use account::{Notifications, Users};
pub use auth::Auth;
pub use orders::{Orders, Payments};
pub use products::{Favorites, Products, Reviews};
pub use types::{
    CreateOrderRequest, CreatePaymentRequest, CreateReviewRequest, Favorite,
    ForgotPasswordRequest, LoginRequest, LoginResponse, NewProduct, Notification, Order,
    PaymentResponse, Product, ProductImage, ProductQuery, RegisterRequest, Review, UserProfile,
};
