//! Integration tests for the BULTEX website.
//!
//! Every test is `#[ignore]`d because it needs running servers and a
//! migrated database.
//!
//! # Running Tests
//!
//! ```bash
//! bultex-cli migrate
//! cargo run -p bultex-storefront &
//! cargo run -p bultex-admin &
//! cargo test -p bultex-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - default `http://localhost:3001`
//! - `ADMIN_TEST_USERNAME` / `ADMIN_TEST_PASSWORD` - an existing admin account
//!   (create one with `bultex-cli admin create`)
//! - `DATABASE_URL` - the database both servers use; tests that check stored
//!   rows connect to it directly

use reqwest::{Client, redirect};
use sqlx::PgPool;

/// Base URL of the public site.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of the admin dashboard.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Client with a cookie store that does not follow redirects, so tests can
/// assert on `Location` headers.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Connect to the database the servers under test use.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the database is unreachable.
#[allow(clippy::expect_used)]
pub async fn database() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to DATABASE_URL")
}

/// Product ids linked from a catalog page, in page order.
#[must_use]
pub fn product_links(html: &str) -> Vec<String> {
    html.split("href=\"/producto/")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(ToString::to_string)
        .collect()
}

/// Credentials for the test admin account, if configured.
#[must_use]
pub fn admin_credentials() -> Option<(String, String)> {
    let username = std::env::var("ADMIN_TEST_USERNAME").ok()?;
    let password = std::env::var("ADMIN_TEST_PASSWORD").ok()?;
    Some((username, password))
}

/// Sign `client` into the admin dashboard.
///
/// # Panics
///
/// Panics if the test credentials are not configured or login fails.
#[allow(clippy::expect_used)]
pub async fn admin_login(client: &Client) {
    let (username, password) =
        admin_credentials().expect("ADMIN_TEST_USERNAME and ADMIN_TEST_PASSWORD must be set");

    let response = client
        .post(format!("{}/admin/login", admin_base_url()))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .expect("Failed to reach admin login");

    assert!(
        response.status().is_redirection(),
        "login failed with status {}",
        response.status()
    );
    assert_eq!(location(&response).as_deref(), Some("/admin/dashboard"));
}
