//! Caller authentication

mod jwt;

pub use jwt::{CallerClaims, JwtConfig, JwtService};
