//! CLI command implementations.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use evtb_client::{
    ApiClient, ApiRequest, ClientConfig, Method, Navigator, Product, ProductQuery,
};

/// Terminal stand-in for page navigation. There is no page to leave, so a
/// redirect to the login route becomes a notice.
struct CliNavigator;

impl Navigator for CliNavigator {
    fn current_route(&self) -> String {
        String::new()
    }

    fn navigate(&self, route: &str) {
        tracing::warn!(route, "Session expired, run `evtb login` to sign in again");
    }
}

/// Builds the client from the stored configuration.
pub fn client(api_url: Option<&str>) -> Result<ApiClient> {
    let mut config = ClientConfig::load();
    if let Some(url) = api_url {
        config.api_url = url.to_string();
    }
    tracing::debug!(api_url = %config.api_url, "Using backend");

    Ok(ApiClient::from_config(&config, Arc::new(CliNavigator))?)
}

/// Sign in.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<()> {
    let response = client.auth().login(email, password).await?;

    match response.user.and_then(|u| u.full_name) {
        Some(name) => println!("Signed in as {name} <{email}>"),
        None => println!("Signed in as {email}"),
    }
    Ok(())
}

/// Forget the stored session.
pub fn logout(client: &ApiClient) -> Result<()> {
    client.auth().logout();
    println!("Signed out");
    Ok(())
}

/// Renew the stored session.
pub async fn refresh(client: &ApiClient) -> Result<()> {
    client.auth().refresh().await?;
    println!("Session renewed");
    Ok(())
}

/// Show the stored session.
pub fn status(client: &ApiClient) -> Result<()> {
    let tokens = client.tokens();

    println!("EVTB Status");
    println!("===========");
    println!("API:     {}", client.base_url());

    let Some(token) = tokens.get_token() else {
        println!("Session: signed out");
        return Ok(());
    };
    println!("Session: signed in");

    if let Some(claims) = tokens.claims() {
        if let Some(subject) = claims.subject() {
            println!("User:    {subject}");
        }
        if let Some(email) = claims.email() {
            println!("Email:   {email}");
        }
        if let Some(role) = claims.role() {
            println!("Role:    {role}");
        }
        if let Some(expires) = claims.expires_at() {
            println!("Expires: {}", expires.to_rfc3339());
        }
    }

    if tokens.is_token_expired(&token) {
        println!("Token has expired; the next request will likely be rejected.");
    } else if tokens.is_token_expiring_soon(&token) {
        println!("Token expires soon.");
    }

    Ok(())
}

fn print_product(product: &Product) {
    println!(
        "#{:<6} {:<40} {:>15.0} VND  {}",
        product.id,
        product.title,
        product.price,
        product.status.as_deref().unwrap_or("-")
    );
}

/// List listings.
pub async fn products_list(
    client: &ApiClient,
    search: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<()> {
    let query = ProductQuery {
        search,
        page,
        page_size,
        ..ProductQuery::default()
    };
    let products = client.products().list(&query).await?;

    if products.is_empty() {
        println!("No listings found");
    }
    for product in &products {
        print_product(product);
    }
    Ok(())
}

/// Show one listing.
pub async fn products_show(client: &ApiClient, id: i64) -> Result<()> {
    let product = client.products().get(id).await?;

    print_product(&product);
    let details = [
        ("Type", product.product_type.clone()),
        ("Brand", product.brand.clone()),
        ("Model", product.model.clone()),
        ("Year", product.year.map(|y| y.to_string())),
        ("Battery", product.battery_capacity.map(|c| format!("{c} kWh"))),
    ];
    for (label, value) in details {
        if let Some(value) = value {
            println!("  {label:<8} {value}");
        }
    }
    if let Some(description) = &product.description {
        println!();
        println!("{description}");
    }
    for image in &product.images {
        println!("  image: {}", image.image_url);
    }
    Ok(())
}

/// List favorites.
pub async fn favorites_list(client: &ApiClient) -> Result<()> {
    let favorites = client.favorites().list().await?;

    if favorites.is_empty() {
        println!("No favorites yet");
    }
    for favorite in &favorites {
        match &favorite.product {
            Some(product) => print_product(product),
            None => println!("#{}", favorite.product_id),
        }
    }
    Ok(())
}

/// Add a favorite.
pub async fn favorites_add(client: &ApiClient, id: i64) -> Result<()> {
    client.favorites().add(id).await?;
    println!("Added #{id} to favorites");
    Ok(())
}

/// Remove a favorite.
pub async fn favorites_remove(client: &ApiClient, id: i64) -> Result<()> {
    client.favorites().remove(id).await?;
    println!("Removed #{id} from favorites");
    Ok(())
}

/// List orders.
pub async fn orders_list(client: &ApiClient) -> Result<()> {
    let orders = client.orders().list().await?;

    if orders.is_empty() {
        println!("No orders yet");
    }
    for order in &orders {
        println!(
            "#{:<6} product {:<8} {:>15} VND  {}",
            order.id,
            order
                .product_id
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
            order
                .total_amount
                .map_or_else(|| "-".to_string(), |a| format!("{a:.0}")),
            order.status.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Send a raw request and print the response body.
pub async fn request(client: &ApiClient, method: &str, path: &str, data: Option<&str>) -> Result<()> {
    let Ok(method) = Method::from_bytes(method.to_ascii_uppercase().as_bytes()) else {
        bail!("invalid HTTP method: {method}");
    };

    let mut request = ApiRequest::new(method, path);
    if let Some(data) = data {
        let body = serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.json_value(body);
    }

    let body = client.send(request).await?.into_value();
    if !body.is_null() {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtb_client::{ApiError, StoredCredential};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn offline_client() -> ApiClient {
        ApiClient::builder("http://127.0.0.1:9").build().unwrap()
    }

    #[tokio::test]
    async fn test_request_rejects_bad_method() {
        let err = request(&offline_client(), "NOT A METHOD", "/api/Product", None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("invalid HTTP method"));
    }

    #[tokio::test]
    async fn test_request_rejects_bad_json() {
        let err = request(&offline_client(), "post", "/api/Favorite", Some("{oops"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("--data is not valid JSON"));
    }

    #[tokio::test]
    async fn test_request_sends_json_with_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/Favorite"))
            .and(header("Authorization", "Bearer abc"))
            .and(body_json(json!({ "productId": 3 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "favoriteId": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::builder(server.uri()).build().unwrap();
        client
            .tokens()
            .set_credential(&StoredCredential::new("abc"))
            .unwrap();

        request(&client, "post", "/api/Favorite", Some(r#"{"productId":3}"#))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_request_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(path("/api/Order"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = ApiClient::builder(server.uri()).build().unwrap();
        let err = request(&client, "GET", "/api/Order", None).await.unwrap_err();

        assert!(err
            .downcast_ref::<ApiError>()
            .is_some_and(ApiError::is_unauthorized));
    }

    #[test]
    fn test_status_signed_in_and_out() {
        let client = offline_client();
        status(&client).unwrap();

        client
            .tokens()
            .set_credential(&StoredCredential::new("not-a-jwt"))
            .unwrap();
        status(&client).unwrap();

        logout(&client).unwrap();
        assert_eq!(client.tokens().get_token(), None);
    }

    #[tokio::test]
    async fn test_refresh_without_support_fails() {
        let client = offline_client();
        client
            .tokens()
            .set_credential(&StoredCredential::new("abc").with_refresh_token("r"))
            .unwrap();

        let err = refresh(&client).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Refresh(_))
        ));
        assert_eq!(client.tokens().get_token().as_deref(), Some("abc"));
    }
}
