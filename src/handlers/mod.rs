//! Request handlers, grouped by surface: browsing and health probes.

pub mod browse_handlers;
pub mod health_handlers;
