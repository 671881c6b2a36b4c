//! Integration tests for admin authentication and the session gate.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`bultex-cli migrate`)
//! - The admin server running (`cargo run -p bultex-admin`)
//! - Supabase credentials in the server environment
//! - `ADMIN_TEST_USERNAME` / `ADMIN_TEST_PASSWORD` for the signed-in tests

#![allow(clippy::unwrap_used)]

use bultex_integration_tests::{admin_base_url, admin_login, client, location};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_pages_redirect_to_login_without_session() {
    let client = client();
    let base_url = admin_base_url();

    for path in [
        "/admin/dashboard",
        "/admin/productos",
        "/admin/categorias",
        "/admin/catalogos",
        "/admin/imagenes",
        "/admin/usuarios",
        "/admin/configuracion",
    ] {
        let resp = client.get(format!("{base_url}{path}")).send().await.unwrap();
        assert!(resp.status().is_redirection(), "{path}");
        assert_eq!(location(&resp).as_deref(), Some("/admin/login"), "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_api_without_session_is_unauthorized() {
    let resp = client()
        .get(format!("{}/api/test-supabase", admin_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and Supabase credentials"]
async fn test_wrong_password_rerenders_login() {
    let resp = client()
        .post(format!("{}/admin/login", admin_base_url()))
        .form(&[("username", "no-existe"), ("password", "incorrecta")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Usuario o contraseña incorrectos"));
    assert!(body.contains("value=\"no-existe\""));
}

#[tokio::test]
#[ignore = "Requires running admin server and a test admin account"]
async fn test_login_dashboard_and_logout() {
    let client = client();
    let base_url = admin_base_url();

    admin_login(&client).await;

    let resp = client
        .get(format!("{base_url}/admin/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Mensajes recientes"));

    let resp = client
        .post(format!("{base_url}/admin/logout"))
        .send()
        .await
        .unwrap();
    assert!(location(&resp).unwrap().starts_with("/admin/login"));

    let resp = client
        .get(format!("{base_url}/admin/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/admin/login"));
}

#[tokio::test]
#[ignore = "Requires running admin server and a test admin account"]
async fn test_supabase_diagnostics() {
    let client = client();
    admin_login(&client).await;

    let resp = client
        .get(format!("{}/api/test-supabase", admin_base_url()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["userCount"].as_u64().unwrap() >= 1);
    assert!(body["users"][0]["email"].is_string());
}

#[tokio::test]
#[ignore = "Requires running admin server and a test admin account"]
async fn test_settings_tab_round_trip() {
    let client = client();
    let base_url = admin_base_url();
    admin_login(&client).await;

    let resp = client
        .get(format!("{base_url}/admin/configuracion?tab=social"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("name=\"instagram_url\""));

    let resp = client
        .get(format!("{base_url}/admin/configuracion?tab=desconocida"))
        .send()
        .await
        .unwrap();
    assert!(resp.text().await.unwrap().contains("name=\"company_name\""));
}
