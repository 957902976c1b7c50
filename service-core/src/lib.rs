//! service-core: Shared infrastructure for the glove commerce services.
pub mod error;
pub mod observability;

pub use axum;
pub use serde;
pub use validator;
