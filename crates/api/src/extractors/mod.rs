//! Custom Axum extractors.
//!
//! Query strings and JSON bodies are decoded as loosely typed params and
//! validated into domain types by the handlers, so every rejection reaches
//! the client in the `validation_failed` shape.

pub mod fields;
pub mod json;
pub mod query;
pub mod session;

pub use json::ApiJson;
pub use query::ApiQuery;
