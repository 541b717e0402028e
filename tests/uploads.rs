use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};

use crate::common::{setup_server, setup_test_db};

mod common;

fn file_form(name: &str, bytes: &[u8]) -> MultipartForm {
    MultipartForm::new()
        .add_text("note", "homework attachment")
        .add_part("file", Part::bytes(bytes.to_vec()).file_name(name.to_string()))
}

#[tokio::test]
async fn route_upload_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    server.save_cookies();

    server
        .post("/api/v1/uploads/")
        .multipart(file_form("notes.txt", b"hello"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .post("/api/v1/account/signup")
        .json(&json!({ "username": "uploader", "password": "uploader" }))
        .await
        .assert_status_ok();

    let resp = server
        .post("/api/v1/uploads/")
        .multipart(file_form("Notes.TXT", b"hello, world"))
        .await;
    resp.assert_status(StatusCode::CREATED);

    let body = resp.json::<Value>();
    assert_eq!(body["size"], 12);
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/api/v1/static/"));
    assert!(url.ends_with(".txt"));

    let stored = server.get(&url).await;
    stored.assert_status_ok();
    assert_eq!(stored.text(), "hello, world");

    server
        .post("/api/v1/uploads/")
        .multipart(file_form("setup.exe", b"MZ"))
        .await
        .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);

    server
        .post("/api/v1/uploads/")
        .multipart(MultipartForm::new().add_text("note", "forgot the file"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    drop(pool);
}
