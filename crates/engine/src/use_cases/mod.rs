//! Application use cases, one struct per operation.

pub mod assets;
pub mod auth;
pub mod catalog;
pub mod ingestion;
pub mod sessions;
pub mod stats;
pub mod story_graph;
pub mod upload;
