//! Request tracking layers: request ids and sensitive header masking

use axum::http::HeaderName;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

use crate::ids::MakeTypedRequestId;

/// Header used when the configured request id header is not a valid name
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

/// Headers masked in traces
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
];

fn request_id_header(name: &str) -> HeaderName {
    HeaderName::try_from(name).unwrap_or_else(|_| {
        tracing::warn!(header = name, "invalid request id header, using x-request-id");
        HeaderName::from_static(DEFAULT_REQUEST_ID_HEADER)
    })
}

/// Assigns a `req_...` id to requests that arrive without one
pub fn request_id_layer(header: &str) -> SetRequestIdLayer<MakeTypedRequestId> {
    SetRequestIdLayer::new(request_id_header(header), MakeTypedRequestId)
}

/// Copies the request id onto the response
pub fn request_id_propagation_layer(header: &str) -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(request_id_header(header))
}

pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    let headers = SENSITIVE_HEADERS
        .iter()
        .filter_map(|h| HeaderName::try_from(*h).ok())
        .collect::<Vec<_>>();
    SetSensitiveRequestHeadersLayer::new(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_headers_constant() {
        assert!(SENSITIVE_HEADERS.contains(&"authorization"));
        assert!(SENSITIVE_HEADERS.contains(&"x-api-key"));
    }

    #[test]
    fn test_request_id_header_fallback() {
        assert_eq!(request_id_header("x-correlation-id").as_str(), "x-correlation-id");
        assert_eq!(request_id_header("bad header").as_str(), DEFAULT_REQUEST_ID_HEADER);
    }
}
