//! Shared helpers for router-level tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use cropsense_api::{create_router, ApiConfig, AppState};
use cropsense_predict::PredictionService;
use cropsense_storage::StorageRoot;
use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "cropsense-test-boundary";

/// A router over a throwaway upload root.
pub struct TestApp {
    pub router: Router,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with(ApiConfig::default(), None).await
    }

    pub async fn with(mut config: ApiConfig, predictions: Option<Arc<dyn PredictionService>>) -> Self {
        let dir = TempDir::new().unwrap();
        let upload_dir = dir.path().join("uploads");
        config.upload_root = upload_dir.clone();

        let storage = StorageRoot::new(&config.upload_root, &config.upload_public_prefix);
        storage.init().await.unwrap();

        let state = AppState::with_services(config, storage, predictions);
        Self {
            router: create_router(state, None),
            upload_dir,
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, parts: &[Part<'_>]) -> TestResponse {
        self.send(multipart_request(uri, parts)).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Names of all files in the upload root, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.upload_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// `src` of the first `<img>` in an HTML body.
    pub fn img_src(&self) -> String {
        let html = self.text();
        let start = html.find("<img src=\"").expect("no <img> in body") + "<img src=\"".len();
        let end = html[start..].find('"').unwrap();
        html[start..start + end].to_string()
    }
}

/// One part of a multipart form.
pub enum Part<'a> {
    File {
        name: &'a str,
        filename: Option<&'a str>,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn file<'a>(filename: &'a str, bytes: &'a [u8]) -> Part<'a> {
    Part::File {
        name: "file",
        filename: Some(filename),
        bytes,
    }
}

pub fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part::Text { name, value }
}

/// `file` plus all four region fields.
pub fn crop_form<'a>(filename: &'a str, bytes: &'a [u8], region: [&'a str; 4]) -> Vec<Part<'a>> {
    vec![
        file(filename, bytes),
        text("left", region[0]),
        text("top", region[1]),
        text("right", region[2]),
        text("bottom", region[3]),
    ]
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, filename, bytes } => {
                match filename {
                    Some(filename) => body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    ),
                    None => body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    ),
                }
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}").as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let body = multipart_body(parts);
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode_png(&RgbImage::from_pixel(width, height, Rgb(color)))
}

/// Every pixel encodes its own coordinates.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    encode_png(&RgbImage::from_fn(width, height, |x, y| {
        Rgb([x as u8, y as u8, 200])
    }))
}

pub fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub fn decode(bytes: &[u8]) -> RgbImage {
    image::load_from_memory(bytes).unwrap().to_rgb8()
}
