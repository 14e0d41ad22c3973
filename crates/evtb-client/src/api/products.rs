//! Listings, favorites and reviews.

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

use super::types::{
    CreateReviewRequest, Favorite, Listing, NewProduct, Product, ProductQuery, Review,
};
use crate::error::{ApiError, ApiResult};
use crate::request::{ApiClient, ApiRequest};

const PRODUCTS: &str = "/api/Product";
const PRODUCT_IMAGES: &str = "/api/ProductImage";
const FAVORITES: &str = "/api/Favorite";
const REVIEWS: &str = "/api/Review";

/// Listing endpoints.
pub struct Products<'a> {
    client: &'a ApiClient,
}

/// Favorite endpoints.
pub struct Favorites<'a> {
    client: &'a ApiClient,
}

/// Review endpoints.
pub struct Reviews<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    /// Listing endpoints.
    #[must_use]
    pub fn products(&self) -> Products<'_> {
        Products { client: self }
    }

    /// Favorite endpoints.
    #[must_use]
    pub fn favorites(&self) -> Favorites<'_> {
        Favorites { client: self }
    }

    /// Review endpoints.
    #[must_use]
    pub fn reviews(&self) -> Reviews<'_> {
        Reviews { client: self }
    }
}

impl Products<'_> {
    /// Lists products matching `query`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn list(&self, query: &ProductQuery) -> ApiResult<Vec<Product>> {
        let request = query
            .to_pairs()
            .into_iter()
            .fold(ApiRequest::get(PRODUCTS), |req, (name, value)| {
                req.query(name, value)
            });
        let listing: Listing<Product> = self.client.send(request).await?.deserialize()?;
        Ok(listing.into_vec())
    }

    /// Fetches one product.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get(&self, id: i64) -> ApiResult<Product> {
        self.client.get(&format!("{PRODUCTS}/{id}")).await
    }

    /// Posts a new listing. It starts out pending moderation.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn create(&self, product: &NewProduct) -> ApiResult<Product> {
        let created: Product = self.client.post(PRODUCTS, product).await?;
        tracing::info!(product_id = created.id, "Listing created");
        Ok(created)
    }

    /// Replaces a listing's fields.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn update(&self, id: i64, product: &NewProduct) -> ApiResult<Product> {
        self.client.put(&format!("{PRODUCTS}/{id}"), product).await
    }

    /// Deletes a listing.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("{PRODUCTS}/{id}")).await
    }

    /// Uploads one image for a listing as `multipart/form-data`.
    ///
    /// Returns whatever the backend answers with.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn upload_image(
        &self,
        product_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<Value> {
        let form = Form::new()
            .text("productId", product_id.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let body = self
            .client
            .send(ApiRequest::post(PRODUCT_IMAGES).multipart(form))
            .await?;
        Ok(body.into_value())
    }
}

impl Favorites<'_> {
    /// Lists the signed-in user's favorites.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn list(&self) -> ApiResult<Vec<Favorite>> {
        let listing: Listing<Favorite> = self.client.get(FAVORITES).await?;
        Ok(listing.into_vec())
    }

    /// Adds a product to favorites.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn add(&self, product_id: i64) -> ApiResult<()> {
        self.client
            .send(ApiRequest::post(FAVORITES).json_value(json!({ "productId": product_id })))
            .await?;
        Ok(())
    }

    /// Removes a product from favorites.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn remove(&self, product_id: i64) -> ApiResult<()> {
        self.client
            .delete(&format!("{FAVORITES}/{product_id}"))
            .await
    }
}

impl Reviews<'_> {
    /// Reviews left on a product.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn for_product(&self, product_id: i64) -> ApiResult<Vec<Review>> {
        let listing: Listing<Review> = self
            .client
            .get(&format!("{REVIEWS}/product/{product_id}"))
            .await?;
        Ok(listing.into_vec())
    }

    /// Leaves a review.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the rating is outside 1 to 5,
    /// without contacting the backend.
    pub async fn create(&self, req: &CreateReviewRequest) -> ApiResult<Review> {
        if !(1..=5).contains(&req.rating) {
            return Err(ApiError::InvalidRequest(format!(
                "rating must be between 1 and 5, got {}",
                req.rating
            )));
        }
        self.client.post(REVIEWS, req).await
    }
}
