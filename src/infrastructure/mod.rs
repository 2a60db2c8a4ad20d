//! Infrastructure layer - Storage, propagation and service implementations

pub mod access;
pub mod auth;
pub mod logging;
pub mod membership;
pub mod resource;
pub mod storage;
pub mod team;
