//! Taleforge Engine library.
//!
//! This crate contains all server-side code for the Taleforge admin backend.
//!
//! ## Structure
//!
//! - `use_cases/` - Ingestion, asset, reporting and auth flows
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition
//! - `config` - Environment-backed configuration

pub mod api;
pub mod app;
pub mod config;
pub mod infrastructure;
pub mod prompt_templates;
pub mod use_cases;

pub use app::App;
pub use config::AppConfig;
