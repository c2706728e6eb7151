use axum::{
    body::{Body, Bytes},
    extract::Query,
    http::{StatusCode, header},
    response::Response,
    Json,
};
use axum::extract::multipart::Multipart;
use log::{debug, info};
use std::time::Instant;

use crate::error::{Error, Result as GeoTiffResult};
use crate::io::ByteOrder;
use crate::session::{GeoTiffSession, SessionOptions};
use crate::source::DecodedImage;
use crate::types::Dimensions;
use crate::writer::ScanlineSpec;
use super::models::*;

const TIFF_CONTENT_TYPE: &str = "image/tiff";

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Converts an uploaded JPEG into a GeoTIFF
///
/// Expects multipart fields `image` plus `origin_x`, `origin_y`,
/// `scale_x`, `scale_y` and optionally `raster_x`, `raster_y`.
pub async fn convert_jpeg(mut multipart: Multipart) -> Result<Response, ApiError> {
    let start = Instant::now();

    let mut image: Option<Vec<u8>> = None;
    let mut origin_x: Option<f64> = None;
    let mut origin_y: Option<f64> = None;
    let mut scale_x: Option<f64> = None;
    let mut scale_y: Option<f64> = None;
    let mut raster_x = 0.0;
    let mut raster_y = 0.0;

    while let Some(field) = multipart.next_field().await.map_err(|e| bad_request(e.to_string()))? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "image" => {
                check_jpeg_content_type(field.content_type())?;
                let data = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;
                image = Some(data.to_vec());
            }
            "origin_x" | "origin_y" | "scale_x" | "scale_y" | "raster_x" | "raster_y" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                let value = parse_number(&name, &text)?;
                match name.as_str() {
                    "origin_x" => origin_x = Some(value),
                    "origin_y" => origin_y = Some(value),
                    "scale_x" => scale_x = Some(value),
                    "scale_y" => scale_y = Some(value),
                    "raster_x" => raster_x = value,
                    _ => raster_y = value,
                }
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| bad_request("Missing image file".to_string()))?;
    let georeference = GeoreferenceParams {
        origin_x: require(origin_x, "origin_x")?,
        origin_y: require(origin_y, "origin_y")?,
        scale_x: require(scale_x, "scale_x")?,
        scale_y: require(scale_y, "scale_y")?,
        raster_x,
        raster_y,
    };

    let options = SessionOptions::default();
    let bytes = DecodedImage::from_jpeg(&image)
        .map(|decoded| decoded.into_byte_order(options.byte_order))
        .and_then(|decoded| encode_geotiff("upload.tif", &decoded.to_spec(), &georeference, options))
        .map_err(api_error)?;

    info!(
        "converted {} byte JPEG into {} byte GeoTIFF in {:.2} ms",
        image.len(), bytes.len(), start.elapsed().as_secs_f64() * 1000.0
    );
    tiff_response(bytes, "upload.tif")
}

/// Wraps a raw interleaved pixel body in a GeoTIFF
pub async fn convert_raw(
    Query(params): Query<RawImageParams>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let start = Instant::now();

    let byte_order = if params.big_endian { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
    let options = SessionOptions { byte_order, ..SessionOptions::default() };
    let spec = ScanlineSpec::new(
        Dimensions::new(params.width, params.height),
        params.channels,
        params.data_type,
        &body,
    );

    let bytes = encode_geotiff("raw.tif", &spec, &params.georeference(), options)
        .map_err(api_error)?;

    info!(
        "wrapped {}x{} {} raster into {} bytes in {:.2} ms",
        params.width, params.height, params.data_type.name(), bytes.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    tiff_response(bytes, "raw.tif")
}

fn encode_geotiff(
    name: &str,
    spec: &ScanlineSpec,
    georeference: &GeoreferenceParams,
    options: SessionOptions,
) -> GeoTiffResult<Vec<u8>> {
    let transform = georeference.transform();

    let mut session = GeoTiffSession::open_with_options(name, options)?;
    session.set_origin(transform.raster_x, transform.raster_y, transform.model_x, transform.model_y)?;
    session.set_pixel_scale(transform.scale_x, transform.scale_y)?;
    session.write_image(spec)?;

    let (min_x, min_y, max_x, max_y) = transform.bounding_box(spec.width, spec.height);
    debug!("'{}' covers ({}, {}) to ({}, {})", name, min_x, min_y, max_x, max_y);
    session.close()
}

fn tiff_response(bytes: Vec<u8>, filename: &str) -> Result<Response, ApiError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, TIFF_CONTENT_TYPE)
        .header(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename))
        .body(Body::from(bytes))
        .map_err(|e| internal_error(e.to_string()))
}

fn check_jpeg_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    let Some(raw) = content_type else {
        return Ok(());
    };

    let parsed: mime::Mime = raw
        .parse()
        .map_err(|_| bad_request(format!("Invalid content type: {}", raw)))?;

    if parsed.essence_str() == mime::IMAGE_JPEG.essence_str()
        || parsed.essence_str() == mime::APPLICATION_OCTET_STREAM.essence_str()
    {
        Ok(())
    } else {
        Err(bad_request(format!("Expected image/jpeg, got {}", raw)))
    }
}

fn parse_number(name: &str, text: &str) -> Result<f64, ApiError> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(bad_request(format!("Invalid {}: {:?}", name, text))),
    }
}

fn require(value: Option<f64>, name: &str) -> Result<f64, ApiError> {
    value.ok_or_else(|| bad_request(format!("Missing {} parameter", name)))
}

fn api_error(e: Error) -> ApiError {
    debug!("request failed: {}", e);
    if e.is_invalid_input() {
        bad_request(e.to_string())
    } else {
        internal_error(e.to_string())
    }
}

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

fn internal_error(error: String) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_check() {
        assert!(check_jpeg_content_type(None).is_ok());
        assert!(check_jpeg_content_type(Some("image/jpeg")).is_ok());
        assert!(check_jpeg_content_type(Some("application/octet-stream")).is_ok());
        assert!(check_jpeg_content_type(Some("image/png")).is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("scale_x", " 0.5 ").unwrap(), 0.5);
        assert!(parse_number("scale_x", "NaN").is_err());
        assert!(parse_number("scale_x", "wide").is_err());
    }

    #[test]
    fn test_error_status() {
        let (status, _) = api_error(Error::InvalidArgument("short".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = api_error(Error::UnderlyingWriteFailed("disk".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
