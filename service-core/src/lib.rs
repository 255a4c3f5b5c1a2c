//! service-core: shared infrastructure for the upload service.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
