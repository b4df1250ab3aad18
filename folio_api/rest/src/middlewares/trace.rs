use std::time::Duration;

use axum::{
    extract::{MatchedPath, Request},
    response::Response,
    Router,
};
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{debug, field, warn, Span};

use super::{client_ip::ClientIp, request_id::RequestId};

pub fn add<S: Clone + Send + Sync + 'static>(router: Router<S>) -> Router<S> {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(make_span)
            .on_request(on_request)
            .on_response(on_response)
            .on_body_chunk(())
            .on_eos(())
            .on_failure(on_failure),
    )
}

fn make_span(request: &Request) -> Span {
    let method = request.method();
    // unmatched requests fall back to the raw path so 404s stay readable
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str())
        .unwrap_or_else(|| request.uri().path());
    let client_ip = request.extensions().get::<ClientIp>().map(|ip| ip.0);
    let request_id = request.extensions().get::<RequestId>().copied();

    tracing::info_span!(
        "http-request",
        %method,
        %route,
        client_ip = client_ip.map(field::display),
        request_id = request_id.map(field::display),
        status = field::Empty,
    )
}

fn on_request(_request: &Request, _span: &Span) {
    debug!("started processing request")
}

fn on_response(response: &Response, latency: Duration, span: &Span) {
    let status = response.status();
    span.record("status", status.as_u16());
    if status.is_server_error() {
        warn!(?latency, "request failed");
    } else {
        debug!(?latency, "finished processing request");
    }
}

fn on_failure(failure: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    if let ServerErrorsFailureClass::Error(err) = failure {
        warn!(?latency, "request aborted: {err}");
    }
}
