//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks store connectivity and spool I/O

use crate::services::store_service::StoreService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Issues a ListBuckets call against the object store.
/// 2. Performs a best-effort write/read/delete against the spool directory.
///
/// Returns JSON describing each check. HTTP 200 when all checks pass,
/// HTTP 503 when any check fails.
pub async fn readyz(State(service): State<StoreService>) -> impl IntoResponse {
    // 1) Store check
    let store_check = match service.list_buckets().await {
        Ok(_) => (true, None::<String>),
        Err(e) => (false, Some(format!("error: {}", e))),
    };

    // 2) Spool write/read/delete check (use a temp file under spool_dir)
    let spool_check = probe_spool(&service.spool_dir).await;

    // Build response JSON
    let store_ok = store_check.0;
    let spool_ok = spool_check.0;
    let overall_ok = store_ok && spool_ok;

    let mut checks = HashMap::new();
    checks.insert(
        "store",
        CheckStatus {
            ok: store_ok,
            error: store_check.1,
        },
    );
    checks.insert(
        "spool",
        CheckStatus {
            ok: spool_ok,
            error: spool_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Round-trip a probe file through the spool directory. Downloads depend on
/// this directory being writable, so readiness fails when it is not.
async fn probe_spool(dir: &std::path::Path) -> (bool, Option<String>) {
    let probe_path = dir.join(format!(".readyz-{}", Uuid::new_v4()));
    let result = async {
        fs::write(&probe_path, b"readyz").await?;
        let bytes = fs::read(&probe_path).await?;
        fs::remove_file(&probe_path).await?;
        Ok::<_, std::io::Error>(bytes)
    }
    .await;
    match result {
        Ok(bytes) if bytes == b"readyz" => (true, None),
        Ok(_) => {
            let _ = fs::remove_file(&probe_path).await;
            (false, Some("probe file content mismatch".into()))
        }
        Err(e) => {
            let _ = fs::remove_file(&probe_path).await;
            (false, Some(format!("spool probe failed: {}", e)))
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::routes::routes::routes;
    use crate::services::store_service::{StoreService, build_client};

    #[tokio::test]
    async fn healthz_is_always_ok() {
        let cfg = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            endpoint: "http://127.0.0.1:1".into(),
            region: "us-east-1".into(),
            access_key: "test".into(),
            secret_key: "test".into(),
            spool_dir: "./data/spool-test".into(),
        };
        let store = StoreService::new(build_client(&cfg), cfg.spool_dir.clone());
        let app = routes().with_state(store);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
