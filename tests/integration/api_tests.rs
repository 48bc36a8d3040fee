//! API integration tests
//!
//! Run against a live server with a bootstrap administrator `admin`/`admin`:
//! cargo test --test api_tests -- --ignored

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080";

const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";

/// Sign in and return the bearer token
async fn sign_in(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/signin", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send signin request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse signin response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    sign_in(client, "admin", "admin").await
}

/// Register a reader through the admin and return (id, username)
async fn create_reader(client: &Client, admin: &str, password: &str) -> (String, String) {
    let username = format!("reader-{}", Uuid::new_v4());
    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "username": username,
            "password": password,
            "role": "reader"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    (body["id"].as_str().expect("No id").to_string(), username)
}

async fn upload_book(client: &Client, token: &str, title: &str, content: Vec<u8>) -> reqwest::Response {
    let form = multipart::Form::new()
        .text("title", title.to_string())
        .text("author", "Ursula K. Le Guin")
        .text("subject", "Fiction")
        .part(
            "bookFile",
            multipart::Part::bytes(content)
                .file_name("book.pdf")
                .mime_str("application/pdf")
                .expect("valid mime"),
        );

    client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send upload")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_signin_returns_token_with_claims() {
    let client = Client::new();

    let response = client
        .post(format!("{}/signin", BASE_URL))
        .json(&json!({ "username": "admin", "password": "admin" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "administrator");

    // Signature is checked by the server; here only the claims matter
    let token = body["token"].as_str().expect("No token");
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    let claims = decode::<Value>(token, &DecodingKey::from_secret(&[]), &validation)
        .expect("Failed to decode token")
        .claims;

    assert_eq!(claims["username"], "admin");
    assert_eq!(claims["role"], "administrator");

    let iat = claims["iat"].as_i64().expect("No iat");
    let exp = claims["exp"].as_i64().expect("No exp");
    assert_eq!(exp - iat, 30 * 60);

    let now = chrono::Utc::now().timestamp();
    assert!((exp - (now + 30 * 60)).abs() <= 60);
}

#[tokio::test]
#[ignore]
async fn test_signin_wrong_password_and_unknown_user() {
    let client = Client::new();

    let response = client
        .post(format!("{}/signin", BASE_URL))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post(format!("{}/signin", BASE_URL))
        .json(&json!({ "username": format!("ghost-{}", Uuid::new_v4()), "password": "x" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_book_round_trip() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = upload_book(&client, &token, "The Dispossessed", SAMPLE_PDF.to_vec()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["id"].as_str().expect("No id").to_string();
    assert_eq!(body["message"], format!("book created with id: {}", id));

    // Metadata
    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["title"], "The Dispossessed");
    assert_eq!(book["author"], "Ursula K. Le Guin");
    assert_eq!(book["subject"], "Fiction");

    // File content comes back byte for byte
    let response = client
        .get(format!("{}/books/{}/file", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(
        response.headers()["content-length"],
        SAMPLE_PDF.len().to_string().as_str()
    );
    let content = response.bytes().await.expect("Failed to read body");
    assert_eq!(content.as_ref(), SAMPLE_PDF);

    // Listed
    let books: Vec<Value> = client
        .get(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(books.iter().any(|b| b["id"] == id.as_str()));

    // Deleted, then gone
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    for path in [format!("/books/{}", id), format!("/books/{}/file", id)] {
        let response = client
            .get(format!("{}{}", BASE_URL, path))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
#[ignore]
async fn test_book_update_is_merge_patch() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = upload_book(&client, &token, "Original", SAMPLE_PDF.to_vec()).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["id"].as_str().expect("No id").to_string();

    let patch = json!({ "title": "Renamed", "author": "" });
    for _ in 0..2 {
        let response = client
            .put(format!("{}/books/{}", BASE_URL, id))
            .bearer_auth(&token)
            .json(&patch)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["message"], "book updated");
    }

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["title"], "Renamed");
    assert_eq!(book["author"], "Ursula K. Le Guin");
    assert_eq!(book["subject"], "Fiction");

    client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
}

#[tokio::test]
#[ignore]
async fn test_non_pdf_upload_is_rejected() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = upload_book(&client, &token, "Not a book", b"GIF89a....".to_vec()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "only pdf files are supported");
}

#[tokio::test]
#[ignore]
async fn test_missing_resources_are_not_found() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let id = Uuid::new_v4();

    for path in ["books", "users"] {
        let response = client
            .delete(format!("{}/{}/{}", BASE_URL, path, id))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = client
            .put(format!("{}/{}/{}", BASE_URL, path, id))
            .bearer_auth(&token)
            .json(&json!({ "title": "x", "username": "x" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
#[ignore]
async fn test_concurrent_duplicate_registration() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let username = format!("dup-{}", Uuid::new_v4());

    let attempts = (0..8).map(|_| {
        client
            .post(format!("{}/users", BASE_URL))
            .bearer_auth(&token)
            .json(&json!({
                "username": username,
                "password": "secret",
                "role": "reader"
            }))
            .send()
    });

    let statuses: Vec<StatusCode> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.expect("Failed to send request").status())
        .collect();

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert!(statuses
        .iter()
        .all(|s| *s == StatusCode::CREATED || *s == StatusCode::CONFLICT));
}

#[tokio::test]
#[ignore]
async fn test_reader_can_read_but_not_mutate() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (reader_id, reader_name) = create_reader(&client, &admin, "pass").await;
    let reader = sign_in(&client, &reader_name, "pass").await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = upload_book(&client, &reader, "Forbidden", SAMPLE_PDF.to_vec()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/users", BASE_URL))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Users never expose password hashes
    let user: Value = client
        .get(format!("{}/users/{}", BASE_URL, reader_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(user["username"], reader_name.as_str());
    assert!(user.get("password").is_none());

    client
        .delete(format!("{}/users/{}", BASE_URL, reader_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
}
