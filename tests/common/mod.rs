#![allow(dead_code)]

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::header,
    test, web, App,
};
use pandas_users::{config::Config, AppState};
use serde_json::json;
use tempfile::TempDir;

pub const BOUNDARY: &str = "pandas-boundary";

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub dir: TempDir,
}

impl TestContext {
    pub fn new() -> TestContext {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = dir.path().join("users.db").to_string_lossy().into_owned();
        let images = dir.path().join("images").to_string_lossy().into_owned();

        let config = Config::from_lookup(|key| {
            match key {
                "DATABASE_URL" => Some(db.clone()),
                "IMAGE_DIR" => Some(images.clone()),
                "POOL_SIZE" => Some("2".to_string()),
                "MAX_IMAGE_BYTES" => Some("1024".to_string()),
                "HASH_PASSES" => Some("1".to_string()),
                "HASH_KIB" => Some("8".to_string()),
                _ => None,
            }
        })
        .expect("Failed to build test config");

        let state = AppState::from_config(&config, b"test-pepper".to_vec())
            .expect("Failed to initialize AppState");

        TestContext {
            state: web::Data::new(state),
            dir,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.state.clone())
            .configure(pandas_users::configure)
    }
}

pub fn credentials(username: &str, password: &str) -> serde_json::Value {
    json!({ "username": username, "password": password })
}

pub fn register_request(username: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/users/")
        .set_json(credentials(username, password))
}

pub fn auth_request(username: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/auth")
        .set_json(credentials(username, password))
}

/// A single-part multipart body carrying `bytes` under `field`.
pub fn multipart_body(field: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"upload\"\r\nContent-Type: {ct}\r\n\r\n",
        b = BOUNDARY,
        f = field,
        ct = content_type,
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(
    method: test::TestRequest,
    username: &str,
    field: &str,
    content_type: &str,
    bytes: &[u8],
) -> test::TestRequest {
    method
        .uri(&format!("/users/{}/profile/image", username))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(field, content_type, bytes))
}
