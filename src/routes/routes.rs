//! Defines routes for the browsing surface.
//!
//! ## Structure
//! - **Browsing endpoints**
//!   - `GET  /` — list buckets
//!   - `GET  /bucket/{bucket}` — list objects (supports prefix, delimiter, continuation_token)
//!   - `GET  /download/{bucket}/{*key}` — download an object as an attachment
//!   - `POST /create_bucket` — create a bucket from the index form
//!
//! - **Probe endpoints**
//!   - `GET /healthz` — liveness
//!   - `GET /readyz` — readiness (store + spool directory)
//!
//! The wildcard `*key` allows nested keys like `photos/2025/img.jpg`.

use crate::{
    handlers::{
        browse_handlers::{create_bucket, download_object, index, list_objects},
        health_handlers::{healthz, readyz},
    },
    services::store_service::StoreService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for the whole gateway.
///
/// The router carries shared state (`StoreService`) to all handlers; there
/// is no other state to thread through.
pub fn routes() -> Router<StoreService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // browsing endpoints
        .route("/", get(index))
        .route("/bucket/{bucket}", get(list_objects))
        .route("/download/{bucket}/{*key}", get(download_object))
        .route("/create_bucket", post(create_bucket))
}
