//! Admin gate middleware
//!
//! Dataset management and export sit behind this gate. It is a stub that
//! allows every caller through; real role checks are expected to happen
//! in front of this service, and callers must not treat the gate as a
//! security boundary.

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::debug;

/// Gate for admin-only routes. Currently allows all requests.
pub async fn admin_gate(request: Request, next: Next) -> Response {
    debug!(path = %request.uri().path(), "Admin gate passthrough");
    next.run(request).await
}
