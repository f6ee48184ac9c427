//! End-to-end tests for the crop flow and static serving.

mod common;

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use cropsense_api::ApiConfig;
use cropsense_models::RegionPolicy;

use common::*;

const RED: [u8; 3] = [255, 0, 0];

#[tokio::test]
async fn test_landing_page() {
    let app = TestApp::new().await;

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains(r#"action="/crop""#));
}

#[tokio::test]
async fn test_crop_red_square() {
    let app = TestApp::new().await;
    let png = solid_png(100, 100, RED);

    let response = app
        .post_form("/crop", &crop_form("a.png", &png, ["10", "10", "50", "50"]))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Image cropped successfully!"));
    assert!(html.contains("a.png"));
    assert!(html.contains(r#"<a href="/">Go Back</a>"#));

    let src = response.img_src();
    assert!(src.starts_with("/uploads/cropped_"), "unexpected src {src}");
    assert!(src.ends_with(".png"));

    // Original and derivative side by side
    let stored = app.stored_files();
    assert_eq!(stored.len(), 2);
    let derived_name = src.trim_start_matches("/uploads/");
    assert!(stored.iter().any(|f| f == derived_name));
    let original_name = derived_name.trim_start_matches("cropped_");
    assert!(stored.iter().any(|f| f == original_name));

    let original = std::fs::read(app.upload_dir.join(original_name)).unwrap();
    assert_eq!(original, png);

    let cropped = decode(&std::fs::read(app.upload_dir.join(derived_name)).unwrap());
    assert_eq!(cropped.dimensions(), (40, 40));
    assert!(cropped.pixels().all(|p| p.0 == RED));
}

#[tokio::test]
async fn test_crop_maps_source_pixels() {
    let app = TestApp::new().await;
    let png = gradient_png(64, 48);

    let response = app
        .post_form("/crop", &crop_form("grid.png", &png, ["5", "7", "25", "37"]))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let served = app.get(&response.img_src()).await;
    let cropped = decode(&served.body);
    assert_eq!(cropped.dimensions(), (20, 30));
    for (x, y, pixel) in cropped.enumerate_pixels() {
        assert_eq!(pixel.0, [(x + 5) as u8, (y + 7) as u8, 200]);
    }
}

#[tokio::test]
async fn test_region_fields_before_file() {
    let app = TestApp::new().await;
    let png = solid_png(30, 30, RED);

    let parts = vec![
        text("left", "0"),
        text("top", "0"),
        text("right", "10"),
        text("bottom", "20"),
        file("first.png", &png),
    ];
    let response = app.post_form("/crop", &parts).await;

    assert_eq!(response.status, StatusCode::OK);
    let cropped = decode(&app.get(&response.img_src()).await.body);
    assert_eq!(cropped.dimensions(), (10, 20));
}

#[tokio::test]
async fn test_no_region_fields_keeps_full_image() {
    let app = TestApp::new().await;
    let png = gradient_png(32, 16);

    let response = app.post_form("/crop", &[file("whole.png", &png)]).await;

    assert_eq!(response.status, StatusCode::OK);
    let cropped = decode(&app.get(&response.img_src()).await.body);
    assert_eq!(cropped, decode(&png));
}

#[tokio::test]
async fn test_non_numeric_coordinate_rejected() {
    let app = TestApp::new().await;
    let png = solid_png(100, 100, RED);

    let response = app
        .post_form("/crop", &crop_form("a.png", &png, ["abc", "10", "50", "50"]))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["detail"], "Invalid crop coordinates");
    assert_eq!(body["code"], "invalid_crop_coordinates");

    // The original is kept, no derivative exists
    let stored = app.stored_files();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].starts_with("cropped_"));
}

#[tokio::test]
async fn test_missing_fields_default_to_extent() {
    let app = TestApp::new().await;
    let png = solid_png(20, 20, RED);

    let parts = vec![file("a.png", &png), text("left", "1"), text("top", "5")];
    let response = app.post_form("/crop", &parts).await;

    assert_eq!(response.status, StatusCode::OK);
    let cropped = decode(&app.get(&response.img_src()).await.body);
    assert_eq!(cropped.dimensions(), (19, 15));
}

#[tokio::test]
async fn test_blank_coordinate_rejected() {
    let app = TestApp::new().await;
    let png = solid_png(20, 20, RED);

    let parts = vec![file("a.png", &png), text("right", " ")];
    let response = app.post_form("/crop", &parts).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "invalid_crop_coordinates");
}

#[tokio::test]
async fn test_missing_file_part() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/crop", &[text("left", "1"), text("top", "1")])
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["detail"], "No file part");
    assert_eq!(body["code"], "missing_file_part");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_file_field_without_filename_is_not_a_file() {
    let app = TestApp::new().await;

    let parts = [Part::File {
        name: "file",
        filename: None,
        bytes: b"just text",
    }];
    let response = app.post_form("/crop", &parts).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["detail"], "No file part");
}

#[tokio::test]
async fn test_non_multipart_body() {
    let app = TestApp::new().await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/crop")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["detail"], "No file part");
}

#[tokio::test]
async fn test_empty_filename() {
    let app = TestApp::new().await;
    let png = solid_png(10, 10, RED);

    let response = app.post_form("/crop", &[file("", &png)]).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["detail"], "No selected file");
    assert_eq!(body["code"], "empty_filename");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_unreadable_image() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/crop", &[file("notes.png", b"definitely not an image")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["code"], "unreadable_image");
    assert!(app.stored_files().iter().all(|f| !f.starts_with("cropped_")));
}

#[tokio::test]
async fn test_out_of_bounds_rejected_by_default() {
    let app = TestApp::new().await;
    let png = solid_png(100, 100, RED);

    let response = app
        .post_form("/crop", &crop_form("a.png", &png, ["50", "50", "150", "80"]))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "region_out_of_bounds");
}

#[tokio::test]
async fn test_inverted_region_rejected() {
    let app = TestApp::new().await;
    let png = solid_png(100, 100, RED);

    let response = app
        .post_form("/crop", &crop_form("a.png", &png, ["50", "10", "10", "50"]))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "region_out_of_bounds");
}

#[tokio::test]
async fn test_clamp_policy_trims_region() {
    let config = ApiConfig {
        region_policy: RegionPolicy::Clamp,
        ..ApiConfig::default()
    };
    let app = TestApp::with(config, None).await;
    let png = solid_png(100, 100, RED);

    let response = app
        .post_form("/crop", &crop_form("a.png", &png, ["-20", "50", "150", "80"]))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let cropped = decode(&app.get(&response.img_src()).await.body);
    assert_eq!(cropped.dimensions(), (100, 30));
}

#[tokio::test]
async fn test_same_input_same_derivative() {
    let app = TestApp::new().await;
    let png = gradient_png(50, 50);
    let form = crop_form("leaf.png", &png, ["3", "4", "33", "44"]);

    let first = app.post_form("/crop", &form).await;
    let second = app.post_form("/crop", &form).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);

    // Distinct keys, identical bytes
    assert_ne!(first.img_src(), second.img_src());
    let a = app.get(&first.img_src()).await.body;
    let b = app.get(&second.img_src()).await.body;
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_concurrent_same_filename_do_not_collide() {
    let app = TestApp::new().await;
    let red = solid_png(40, 40, RED);
    let blue = solid_png(40, 40, [0, 0, 255]);

    let red_form = crop_form("photo.png", &red, ["0", "0", "20", "20"]);
    let blue_form = crop_form("photo.png", &blue, ["0", "0", "20", "20"]);
    let (red_response, blue_response) = tokio::join!(
        app.post_form("/crop", &red_form),
        app.post_form("/crop", &blue_form),
    );
    assert_eq!(red_response.status, StatusCode::OK);
    assert_eq!(blue_response.status, StatusCode::OK);
    assert_ne!(red_response.img_src(), blue_response.img_src());

    let red_crop = decode(&app.get(&red_response.img_src()).await.body);
    let blue_crop = decode(&app.get(&blue_response.img_src()).await.body);
    assert!(red_crop.pixels().all(|p| p.0 == RED));
    assert!(blue_crop.pixels().all(|p| p.0 == [0, 0, 255]));
    assert_eq!(app.stored_files().len(), 4);
}

#[tokio::test]
async fn test_filename_is_escaped_in_page() {
    let app = TestApp::new().await;
    let png = solid_png(10, 10, RED);

    let response = app
        .post_form("/crop", &[file("<script>x</script>.png", &png)])
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn test_serve_upload_content_type() {
    let app = TestApp::new().await;
    let png = solid_png(12, 12, RED);

    let response = app.post_form("/crop", &[file("a.png", &png)]).await;
    let served = app.get(&response.img_src()).await;

    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.headers[header::CONTENT_TYPE], "image/png");
    assert!(served.headers.contains_key(header::CACHE_CONTROL));
}

#[tokio::test]
async fn test_serve_upload_unknown_or_malformed_key() {
    let app = TestApp::new().await;

    let unknown = app
        .get("/uploads/cropped_0123456789abcdef0123456789abcdef.png")
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let malformed = app.get("/uploads/..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);

    let not_a_key = app.get("/uploads/photo.png").await;
    assert_eq!(not_a_key.status, StatusCode::NOT_FOUND);
    assert_eq!(not_a_key.json()["code"], "not_found");
}

#[tokio::test]
async fn test_body_over_limit() {
    let config = ApiConfig {
        max_body_size: 1024,
        ..ApiConfig::default()
    };
    let app = TestApp::with(config, None).await;
    let big = vec![0u8; 8 * 1024];

    let response = app.post_form("/crop", &[file("big.png", &big)]).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json()["code"], "payload_too_large");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_body_over_limit_without_content_length() {
    let config = ApiConfig {
        max_body_size: 1024,
        ..ApiConfig::default()
    };
    let app = TestApp::with(config, None).await;
    let big = vec![0u8; 8 * 1024];

    let mut request = multipart_request("/crop", &[file("big.png", &big)]);
    request.headers_mut().remove(header::CONTENT_LENGTH);
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json()["code"], "payload_too_large");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_rate_limited_per_client() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        rate_limit_burst: 1,
        trust_proxy_headers: true,
        ..ApiConfig::default()
    };
    let app = TestApp::with(config, None).await;
    let png = solid_png(8, 8, RED);

    let request = || {
        let mut request = multipart_request("/crop", &[file("a.png", &png)]);
        request
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        request
    };

    let first = app.send(request()).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.send(request()).await;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers[header::RETRY_AFTER], "1");
}

#[tokio::test]
async fn test_spoofed_forwarded_for_still_limited() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        rate_limit_burst: 1,
        ..ApiConfig::default()
    };
    let app = TestApp::with(config, None).await;
    let png = solid_png(8, 8, RED);
    let peer = SocketAddr::from(([198, 51, 100, 20], 40000));

    let request = |forwarded_for: &str| {
        let mut request = multipart_request("/crop", &[file("a.png", &png)]);
        request
            .headers_mut()
            .insert("x-forwarded-for", forwarded_for.parse().unwrap());
        request.extensions_mut().insert(ConnectInfo(peer));
        request
    };

    let first = app.send(request("203.0.113.1")).await;
    assert_eq!(first.status, StatusCode::OK);

    // A new forwarded address per request does not earn a new bucket
    let second = app.send(request("203.0.113.2")).await;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.json()["code"], "rate_limited");
}

#[tokio::test]
async fn test_response_headers() {
    let app = TestApp::new().await;

    let response = app.get("/health").await;

    assert!(response.headers.contains_key("x-request-id"));
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = TestApp::new().await;

    let health = app.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.json()["status"], "healthy");

    let ready = app.get("/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
    let body = ready.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["storage"]["status"], "ok");
    assert_eq!(body["checks"]["prediction_service"]["status"], "disabled");
}

#[tokio::test]
async fn test_ready_under_concurrent_checks() {
    let app = TestApp::new().await;

    for _ in 0..25 {
        let responses = tokio::join!(
            app.get("/ready"),
            app.get("/ready"),
            app.get("/ready"),
            app.get("/ready"),
            app.get("/ready"),
            app.get("/ready"),
            app.get("/ready"),
            app.get("/ready"),
        );
        let statuses = [
            responses.0.status,
            responses.1.status,
            responses.2.status,
            responses.3.status,
            responses.4.status,
            responses.5.status,
            responses.6.status,
            responses.7.status,
        ];
        assert!(statuses.iter().all(|s| *s == StatusCode::OK), "{statuses:?}");
    }
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_non_utf8_coordinate_rejected() {
    let app = TestApp::new().await;
    let png = solid_png(20, 20, RED);

    let parts = [
        file("a.png", &png),
        Part::File {
            name: "left",
            filename: None,
            bytes: b"\xff\xfe1",
        },
    ];
    let response = app.post_form("/crop", &parts).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["detail"], "Invalid crop coordinates");
    assert_eq!(body["code"], "invalid_crop_coordinates");
    assert!(app.stored_files().iter().all(|f| !f.starts_with("cropped_")));
}
