// HTTP response utilities for rendered plots and exports
use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
};
use bytes::Bytes;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// CSV export. An empty table is an empty 200 body.
pub fn csv_response(body: Vec<u8>) -> anyhow::Result<Response<Body>> {
    bytes_response(Bytes::from(body), CSV_CONTENT_TYPE)
}

pub fn svg_response(body: String) -> anyhow::Result<Response<Body>> {
    bytes_response(Bytes::from(body), SVG_CONTENT_TYPE)
}

fn bytes_response(body: Bytes, content_type: &'static str) -> anyhow::Result<Response<Body>> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_response_headers() {
        let response = csv_response(b"time,value\n".to_vec()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
    }

    #[test]
    fn test_empty_body_is_ok() {
        let response = svg_response(String::new()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "0");
    }
}
