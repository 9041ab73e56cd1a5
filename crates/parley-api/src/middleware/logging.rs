use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Instrument;

/// Request logging middleware
///
/// Runs every request inside a span carrying a fresh request id. The auth
/// middleware fills in `user_id` once the principal is known.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!(
        "request",
        %request_id,
        %method,
        %uri,
        user_id = tracing::field::Empty,
    );
    let start = Instant::now();

    let response = next.run(req).instrument(span.clone()).await;

    let duration = start.elapsed();
    let status = response.status();

    span.in_scope(|| {
        tracing::info!(
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request processed"
        );
    });

    response
}
