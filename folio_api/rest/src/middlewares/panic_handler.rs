use std::{any::Any, panic::AssertUnwindSafe};

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{from_fn, Next},
    response::Response,
    Router,
};
use futures::FutureExt;
use tracing::field;

use super::request_id::RequestId;
use crate::routes;

/// Answer requests whose handler panicked with the generic error envelope
/// instead of dropping the connection.
pub fn add<S: Clone + Send + Sync + 'static>(router: Router<S>) -> Router<S> {
    router.layer(from_fn(middleware))
}

async fn middleware(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().copied();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            tracing::error!(
                request_id = request_id.map(field::display),
                "request handler panicked: {}",
                panic_message(&*payload)
            );
            routes::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>")
}
