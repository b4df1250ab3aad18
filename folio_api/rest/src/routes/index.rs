use axum::{routing, Router};

pub fn router() -> Router<()> {
    Router::new().route("/", routing::get(index))
}

async fn index() -> &'static str {
    "Portfolio contact relay is running"
}
