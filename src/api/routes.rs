use axum::{
    routing::post,
    Router,
};
use tower_http::cors::CorsLayer;
use tower::ServiceBuilder;
use axum::extract::DefaultBodyLimit;

use super::config::ServerConfig;
use super::handlers::*;

pub fn create_router(config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/geotiff", post(convert_jpeg))
        .route("/api/geotiff/raw", post(convert_raw))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(config.body_limit))
                .layer(CorsLayer::permissive())
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::io::Cursor;
    use tiff::decoder::{Decoder, DecodingResult};
    use tiff::tags::Tag;
    use tower::ServiceExt;

    const BOUNDARY: &str = "skyforest-boundary";

    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match content_type {
                Some(ct) => body.extend_from_slice(format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}.jpg\"\r\nContent-Type: {}\r\n\r\n",
                    name, name, ct
                ).as_bytes()),
                None => body.extend_from_slice(format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name
                ).as_bytes()),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/geotiff")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_raw_endpoint_returns_tiff() {
        let app = create_router(&ServerConfig::default());
        let pixels: Vec<u8> = (0..2 * 3 * 3).collect();

        let request = Request::builder()
            .method("POST")
            .uri("/api/geotiff/raw?width=2&height=3&channels=3&origin_x=10&origin_y=50&scale_x=0.5&scale_y=0.5")
            .body(Body::from(pixels.clone()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/tiff");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mut decoder = Decoder::new(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (2, 3));

        let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(crate::tags::MODEL_TIEPOINT)).unwrap();
        assert_eq!(tiepoint, vec![0.0, 0.0, 0.0, 10.0, 50.0, 0.0]);
        match decoder.read_image().unwrap() {
            DecodingResult::U8(data) => assert_eq!(data, pixels),
            _ => panic!("expected 8-bit samples"),
        }
    }

    #[tokio::test]
    async fn test_raw_endpoint_big_endian() {
        let app = create_router(&ServerConfig::default());

        let request = Request::builder()
            .method("POST")
            .uri("/api/geotiff/raw?width=1&height=1&data_type=u16&big_endian=true&origin_x=0&origin_y=0&scale_x=1&scale_y=1")
            .body(Body::from(vec![0x12, 0x34]))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..2], b"MM");
        match Decoder::new(Cursor::new(bytes.to_vec())).unwrap().read_image().unwrap() {
            DecodingResult::U16(data) => assert_eq!(data, vec![0x1234]),
            _ => panic!("expected 16-bit samples"),
        }
    }

    #[tokio::test]
    async fn test_raw_endpoint_rejects_size_mismatch() {
        let app = create_router(&ServerConfig::default());

        let request = Request::builder()
            .method("POST")
            .uri("/api/geotiff/raw?width=10&height=10&channels=3&origin_x=0&origin_y=0&scale_x=1&scale_y=1")
            .body(Body::from(vec![0u8; 299]))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("299"));
    }

    #[tokio::test]
    async fn test_raw_endpoint_body_limit() {
        let config = ServerConfig { body_limit: 16, ..ServerConfig::default() };
        let app = create_router(&config);

        let request = Request::builder()
            .method("POST")
            .uri("/api/geotiff/raw?width=8&height=8&origin_x=0&origin_y=0&scale_x=1&scale_y=1")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_jpeg_endpoint_returns_tiff() {
        let app = create_router(&ServerConfig::default());
        let request = multipart_request(&[
            ("image", Some("image/jpeg"), crate::source::MID_GRAY_JPEG),
            ("origin_x", None, b"10".as_slice()),
            ("origin_y", None, b"50".as_slice()),
            ("scale_x", None, b"0.5".as_slice()),
            ("scale_y", None, b"0.25".as_slice()),
        ]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/tiff");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mut decoder = Decoder::new(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (2, 2));

        let scale = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(crate::tags::MODEL_PIXEL_SCALE)).unwrap();
        assert_eq!(scale, vec![0.5, 0.25, 0.0]);
        match decoder.read_image().unwrap() {
            DecodingResult::U8(data) => assert!(data.iter().all(|&v| v.abs_diff(128) <= 1)),
            _ => panic!("expected 8-bit samples"),
        }
    }

    #[tokio::test]
    async fn test_jpeg_endpoint_rejects_bad_image() {
        let app = create_router(&ServerConfig::default());
        let request = multipart_request(&[
            ("image", Some("image/jpeg"), b"\xFF\xD8\xFF\xE0".as_slice()),
            ("origin_x", None, b"10".as_slice()),
            ("origin_y", None, b"50".as_slice()),
            ("scale_x", None, b"0.1".as_slice()),
            ("scale_y", None, b"0.1".as_slice()),
        ]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_jpeg_endpoint_requires_fields() {
        let app = create_router(&ServerConfig::default());
        let request = multipart_request(&[("origin_x", None, b"10".as_slice())]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Missing image file");
    }

    #[tokio::test]
    async fn test_jpeg_endpoint_rejects_other_content_types() {
        let app = create_router(&ServerConfig::default());
        let request = multipart_request(&[("image", Some("image/png"), b"\x89PNG".as_slice())]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
