//! Service layer: the single pass-through to the object store.

pub mod store_service;
