//! Shared API types

pub mod error;
pub mod json;
pub mod propagation;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use propagation::PropagationResponse;
