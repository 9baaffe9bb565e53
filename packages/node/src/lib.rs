//! Public surface for the `ldview-node` crate.
//!
//! Plugs the `ldview` render pipeline into axum handlers: content
//! negotiation on `Accept`, viewer extraction from request extensions, and
//! error mapping to `406`/`500` JSON responses. Routing is left to the
//! embedding application.

pub mod auth;
pub mod config;
pub mod error;
pub mod writer;

pub use auth::CurrentViewer;
pub use config::{ConfigError, WriterConfig};
pub use error::{AppError, ErrorResponse};
pub use writer::HtmlWriter;
