//! Request correlation IDs.
//!
//! Every request gets an `x-request-id` that shows up in log lines, in
//! Sentry events, and in the response headers, so a shopper-reported
//! failure can be traced back to the exact request.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream-supplied ID accepted before a fresh one is minted.
const MAX_UPSTREAM_ID_LEN: usize = 64;

/// Keep an upstream proxy's ID only when it is short, non-empty printable
/// ASCII; anything else is discarded so junk header values never end up
/// keyed into logs or Sentry tags.
fn accept_upstream(value: Option<&str>) -> Option<&str> {
    let id = value?.trim();
    if id.is_empty() || id.len() > MAX_UPSTREAM_ID_LEN {
        return None;
    }
    id.chars().all(|c| c.is_ascii_graphic()).then_some(id)
}

/// Middleware that ensures every request has a usable request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let upstream = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok());
    let request_id =
        accept_upstream(upstream).map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    // Echoed back so clients can quote the ID when reporting a problem.
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::accept_upstream;

    #[test]
    fn test_keeps_reasonable_upstream_id() {
        assert_eq!(accept_upstream(Some("abc-123")), Some("abc-123"));
        assert_eq!(accept_upstream(Some("  abc-123  ")), Some("abc-123"));
    }

    #[test]
    fn test_rejects_missing_or_empty() {
        assert_eq!(accept_upstream(None), None);
        assert_eq!(accept_upstream(Some("")), None);
        assert_eq!(accept_upstream(Some("   ")), None);
    }

    #[test]
    fn test_rejects_oversized_or_unprintable() {
        let long = "x".repeat(65);
        assert_eq!(accept_upstream(Some(&long)), None);
        assert_eq!(accept_upstream(Some("has space")), None);
        assert_eq!(accept_upstream(Some("tab\there")), None);
    }
}
