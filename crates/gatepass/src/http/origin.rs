//! Request origin detection for profile URLs.

use axum::http::header::HOST;
use axum::http::HeaderMap;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// `scheme://host` of the request described by `headers`.
///
/// The host comes from the `Host` header, else `fallback_host`. The scheme
/// comes from the first `X-Forwarded-Proto` value when it is `http` or
/// `https`, else `http`.
#[must_use]
pub fn request_origin(headers: &HeaderMap, fallback_host: &str) -> String {
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .unwrap_or(fallback_host);

    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|proto| proto.trim().to_ascii_lowercase())
        .filter(|proto| proto == "http" || proto == "https")
        .unwrap_or_else(|| "http".to_string());

    format!("{scheme}://{host}")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_origin_from_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("gate.local:5000"));
        assert_eq!(request_origin(&headers, "127.0.0.1:5000"), "http://gate.local:5000");
    }

    #[test]
    fn test_origin_falls_back_without_host() {
        assert_eq!(
            request_origin(&HeaderMap::new(), "127.0.0.1:5000"),
            "http://127.0.0.1:5000"
        );
    }

    #[test]
    fn test_origin_honors_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("gate.example.com"));
        headers.insert(FORWARDED_PROTO, HeaderValue::from_static("HTTPS, http"));
        assert_eq!(request_origin(&headers, "x"), "https://gate.example.com");

        headers.insert(FORWARDED_PROTO, HeaderValue::from_static("gopher"));
        assert_eq!(request_origin(&headers, "x"), "http://gate.example.com");
    }
}
