//! API layer - HTTP entry points.

pub mod auth_routes;
pub mod catalog_routes;
pub mod content_routes;
pub mod extract;
pub mod http;
pub mod report_routes;
