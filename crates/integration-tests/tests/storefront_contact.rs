//! Integration tests for `POST /api/contact`.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`bultex-cli migrate`)
//! - The storefront running (`cargo run -p bultex-storefront`)
//!
//! Successful submissions store a row in `contact_messages`; without SMTP
//! settings the row is marked as not emailed.

#![allow(clippy::unwrap_used)]

use bultex_core::ContactSubmission;
use bultex_integration_tests::{client, database, storefront_base_url};
use reqwest::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

fn contact_url() -> String {
    format!("{}/api/contact", storefront_base_url())
}

/// Rows whose message is exactly `message`; each test uses a unique one.
async fn stored_with_message(pool: &PgPool, message: &str) -> i64 {
    sqlx::query_scalar("SELECT count(*) FROM contact_messages WHERE message = $1")
        .bind(message)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_valid_submission_is_accepted() {
    let pool = database().await;
    let message = format!("Necesito cotizar 50 overoles. {}", Uuid::new_v4().simple());
    let submission = ContactSubmission {
        name: "  Prueba Integración ".to_string(),
        email: format!("prueba+{}@example.com", Uuid::new_v4().simple()),
        phone: "8112345678".to_string(),
        message: message.clone(),
    };

    let resp = client()
        .post(contact_url())
        .json(&submission)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Tu mensaje ha sido recibido. Te contactaremos pronto."
    );
    assert!(body["emailSent"].is_boolean());

    assert_eq!(stored_with_message(&pool, &message).await, 1);
    let (name, email_sent): (String, bool) = sqlx::query_as(
        "SELECT name, email_sent FROM contact_messages WHERE message = $1",
    )
    .bind(&message)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(name, "Prueba Integración");
    assert_eq!(email_sent, body["emailSent"].as_bool().unwrap());
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_rejected_submissions_store_nothing() {
    let pool = database().await;
    let message = format!("Cotización {}", Uuid::new_v4().simple());

    let rejected = [
        json!({ "name": "Ana", "email": "ana@example.com", "phone": " ", "message": message }),
        json!({ "name": "Ana", "email": "ana@example", "phone": "8112345678", "message": message }),
    ];
    for payload in rejected {
        let resp = client().post(contact_url()).json(&payload).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{payload}");
    }

    assert_eq!(stored_with_message(&pool, &message).await, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_missing_field_is_rejected() {
    let resp = client()
        .post(contact_url())
        .json(&json!({
            "name": "Ana",
            "email": "ana@example.com",
            "phone": "   ",
            "message": "Hola"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Todos los campos son requeridos");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_invalid_email_is_rejected() {
    let resp = client()
        .post(contact_url())
        .json(&json!({
            "name": "Ana",
            "email": "ana@example",
            "phone": "8112345678",
            "message": "Hola"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Email inválido");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_malformed_json_is_rejected() {
    let resp = client()
        .post(contact_url())
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}
