//! View models for the gateway.
//!
//! Everything here is transient: each struct is borrowed from one object
//! store response, rendered once, and dropped. Nothing is persisted or
//! cached between requests, so the models carry only what the templates
//! display.

use chrono::{DateTime, Utc};

pub mod bucket;
pub mod listing;
pub mod object;

/// Convert an SDK timestamp into a chrono UTC timestamp for display.
pub(crate) fn to_utc(ts: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}
