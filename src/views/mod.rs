//! HTML rendering.
//!
//! One process-wide minijinja environment holds the three embedded
//! templates. Auto-escaping is on for all of them (they are registered with
//! an `.html` name), so store-controlled strings like keys and error
//! messages are safe to interpolate.

use crate::errors::AppError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Utc};
use minijinja::{Environment, context};
use std::sync::LazyLock;

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.add_template("index.html", include_str!("templates/index.html"))
        .expect("index template parses");
    env.add_template("bucket.html", include_str!("templates/bucket.html"))
        .expect("bucket template parses");
    env.add_template("error.html", include_str!("templates/error.html"))
        .expect("error template parses");
    env.add_filter("human_size", human_size);
    env.add_filter("datetime", format_datetime);
    env
});

/// Render a registered template with the given context.
pub fn render(name: &str, ctx: minijinja::Value) -> Result<Html<String>, AppError> {
    let template = TEMPLATES
        .get_template(name)
        .map_err(|err| AppError::internal(format!("template `{}` missing: {}", name, err)))?;
    let html = template
        .render(ctx)
        .map_err(|err| AppError::internal(format!("rendering `{}`: {}", name, err)))?;
    Ok(Html(html))
}

/// Render the error page, carrying the literal message text.
///
/// Falls back to a plain-text body if the template itself fails, so a
/// failure is never answered with a panic or an empty response.
pub fn error_page(status: StatusCode, message: &str) -> Response {
    let body = TEMPLATES.get_template("error.html").and_then(|template| {
        template.render(context! { status => status.as_u16(), message => message })
    });
    match body {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            tracing::error!("failed to render error page: {}", err);
            (status, message.to_string()).into_response()
        }
    }
}

/// Binary-unit size formatting for the listing table.
fn human_size(size_bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if size_bytes < 1024 {
        return format!("{} B", size_bytes);
    }
    let mut value = size_bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Format a serialized RFC 3339 timestamp for display. Values that fail to
/// parse pass through untouched.
fn format_datetime(value: String) -> String {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| {
            ts.with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
        })
        .unwrap_or(value)
}
