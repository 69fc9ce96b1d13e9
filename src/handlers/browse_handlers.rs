//! HTTP handlers for the browsing surface.
//!
//! Each handler is one stateless call-and-render cycle: translate the
//! request into a single store call through `StoreService`, then render a
//! template or stream a file. Failures become `AppError`s that render the
//! error page with the literal message text.

use crate::{
    errors::AppError,
    models::object::ObjectDownload,
    services::store_service::{ListObjectsParams, StoreService},
    views,
};
use axum::{
    Form,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{Html, Redirect, Response},
};
use minijinja::context;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

const DEFAULT_DELIMITER: &str = "/";

/// Query params accepted by the listing page.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub continuation_token: Option<String>,
}

/// Form body for `POST /create_bucket`.
#[derive(Debug, Deserialize)]
pub struct CreateBucketForm {
    pub bucket_name: String,
}

/// `GET /` — list every bucket in the store.
pub async fn index(State(store): State<StoreService>) -> Result<Html<String>, AppError> {
    let buckets = store
        .list_buckets()
        .await
        .map_err(|err| AppError::from_store("failed to list buckets", err))?;
    views::render("index.html", context! { buckets => buckets })
}

/// `GET /bucket/{bucket}` — one page of a bucket listing.
///
/// `prefix`, `delimiter` (default `/`) and `continuation_token` are
/// forwarded to the store; the next token comes back embedded in the
/// "next page" link, so pagination is driven entirely by the client.
pub async fn list_objects(
    State(store): State<StoreService>,
    Path(bucket): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let params = ListObjectsParams {
        prefix: query.prefix.unwrap_or_default(),
        delimiter: query
            .delimiter
            .unwrap_or_else(|| DEFAULT_DELIMITER.to_string()),
        continuation_token: query.continuation_token,
    };
    let page = store.list_objects(&bucket, params).await.map_err(|err| {
        AppError::from_store(
            format!("failed to list objects in bucket `{}`", bucket),
            err,
        )
    })?;
    views::render("bucket.html", context! { page => page })
}

/// `GET /download/{bucket}/{*key}` — stream an object as an attachment.
///
/// The body was already spooled to an unlinked temporary file by the
/// service, so streaming it out holds no memory and leaves nothing on disk
/// once the response (or an aborted connection) drops the handle.
pub async fn download_object(
    State(store): State<StoreService>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (meta, file) = store.download_object(&bucket, &key).await.map_err(|err| {
        AppError::from_store(
            format!("failed to download object `{}` from bucket `{}`", key, bucket),
            err,
        )
    })?;

    let stream = ReaderStream::new(file);
    let mut response = Response::new(Body::from_stream(stream));
    set_attachment_headers(response.headers_mut(), &meta);
    Ok(response)
}

/// `POST /create_bucket` — create a bucket, then bounce back to the index.
pub async fn create_bucket(
    State(store): State<StoreService>,
    Form(form): Form<CreateBucketForm>,
) -> Result<Redirect, AppError> {
    let name = form.bucket_name.trim();
    store.create_bucket(name).await.map_err(|err| {
        AppError::from_store(format!("failed to create bucket `{}`", name), err)
    })?;
    Ok(Redirect::to("/"))
}

fn set_attachment_headers(headers: &mut HeaderMap, meta: &ObjectDownload) {
    let content_type = meta
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&meta.size_bytes.max(0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    // Quotes and control bytes cannot appear inside a quoted filename.
    let filename: String = meta
        .filename
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    let disposition = format!("attachment; filename=\"{}\"", filename);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::routes::routes::routes;
    use crate::services::store_service::build_client;
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    /// A service pointed at a port nothing listens on. Retries are disabled,
    /// so calls fail fast with a dispatch error instead of hanging.
    fn unreachable_store() -> StoreService {
        let cfg = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            endpoint: "http://127.0.0.1:1".into(),
            region: "us-east-1".into(),
            access_key: "test".into(),
            secret_key: "test".into(),
            spool_dir: "./data/spool-test".into(),
        };
        StoreService::new(build_client(&cfg), cfg.spool_dir.clone())
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn unreachable_store_renders_error_page_with_message() {
        let app = routes().with_state(unreachable_store());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_text(response).await;
        assert!(body.contains("failed to list buckets"));
        assert!(body.contains("unreachable"));
    }

    #[tokio::test]
    async fn invalid_bucket_name_in_path_is_rejected_locally() {
        let app = routes().with_state(unreachable_store());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/bucket/NotALegalName")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains("NotALegalName"));
    }

    #[tokio::test]
    async fn create_bucket_validates_before_calling_store() {
        let app = routes().with_state(unreachable_store());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create_bucket")
                    .header(
                        header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(Body::from("bucket_name=AB"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains("between 3 and 63 characters"));
    }

    #[tokio::test]
    async fn traversal_key_is_rejected_locally() {
        let app = routes().with_state(unreachable_store());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/download/demo/a/../b")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn attachment_headers_carry_filename_and_type() {
        let meta = ObjectDownload {
            filename: "file.txt".into(),
            content_type: Some("text/plain".into()),
            size_bytes: 12,
        };
        let mut headers = HeaderMap::new();
        set_attachment_headers(&mut headers, &meta);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(headers[header::CONTENT_LENGTH], "12");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"file.txt\""
        );
    }

    #[test]
    fn attachment_filename_is_sanitized() {
        let meta = ObjectDownload {
            filename: "we\"ird.txt".into(),
            content_type: None,
            size_bytes: 0,
        };
        let mut headers = HeaderMap::new();
        set_attachment_headers(&mut headers, &meta);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"we_ird.txt\""
        );
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    }
}
