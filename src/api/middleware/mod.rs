//! API middleware components

pub mod caller_auth;

pub use caller_auth::RequireCaller;
