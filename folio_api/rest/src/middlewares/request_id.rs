//! Tag each request with a unique id, echoed in the `X-Request-Id` header

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::{from_fn, Next},
    response::Response,
    Router,
};
use base64::{display::Base64Display, engine::general_purpose::URL_SAFE_NO_PAD};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub fn add<S: Clone + Send + Sync + 'static>(router: Router<S>) -> Router<S> {
    router.layer(from_fn(middleware))
}

async fn middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::new();
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.header_value());
    response
}

/// Time-ordered id of a single request, rendered as unpadded url-safe base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }

    fn header_value(self) -> HeaderValue {
        // base64 output is always visible ascii
        HeaderValue::from_str(&self.to_string()).unwrap_or(HeaderValue::from_static("-"))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Base64Display::new(self.0.as_bytes(), &URL_SAFE_NO_PAD).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let first = RequestId::new();
        let second = RequestId::new();

        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn rendered_as_header_safe_base64() {
        let id = RequestId(Uuid::from_bytes([0xfb; 16]));

        let rendered = id.to_string();

        assert_eq!(rendered.len(), 22);
        assert_eq!(rendered, "-_v7-_v7-_v7-_v7-_v7-w");
        assert_eq!(id.header_value(), rendered.as_str());
    }
}
