#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use petstore_pets::Pet;
use petstore_db::{create_pool, DbLocation, DbPool, DbRuntimeSettings};
use petstore_server::{app, init_db, AppState};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const DEFAULT_IMAGE_URL: &str = "/assets/default-pet.jpg";
pub const BOUNDARY: &str = "----petstore-test-boundary";

/// A router over a fresh file-backed database, plus the temp dir holding it.
pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub dir: TempDir,
}

impl TestApp {
    pub fn upload_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn static_images_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("static").join("images")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Builds the app without seeding, so the catalog starts empty.
pub fn setup_empty_app() -> TestApp {
    setup(false)
}

/// Builds the app after running the startup initialization (schema + seed).
pub fn setup_seeded_app() -> TestApp {
    setup(true)
}

fn setup(seed: bool) -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let location = DbLocation::File(dir.path().join("petstore.db"));
    let pool = create_pool(&location, DbRuntimeSettings::default()).expect("failed to create pool");

    if seed {
        init_db(&pool).expect("failed to initialize database");
    } else {
        let conn = pool.get().unwrap();
        petstore_db::ensure_schema(&conn).unwrap();
    }

    let static_dir = dir.path().join("static").join("images");
    std::fs::create_dir_all(&static_dir).unwrap();

    let state = AppState {
        pool: pool.clone(),
        upload_dir: dir.path().join("uploads").to_str().unwrap().to_string(),
        static_images_dir: static_dir.to_str().unwrap().to_string(),
        default_image_url: DEFAULT_IMAGE_URL.to_string(),
    };

    TestApp {
        router: app(state),
        pool,
        dir,
    }
}

/// One part of a multipart form body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn post_pet(parts: &[Part]) -> Request<Body> {
    Request::builder()
        .uri("/pets")
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn post_pet_urlencoded(body: &str) -> Request<Body> {
    Request::builder()
        .uri("/pets")
        .method("POST")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("DELETE")
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_pet(response: Response<Body>) -> Pet {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
