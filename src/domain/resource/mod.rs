//! Shared resource domain - files and folders owned by a team

mod entity;
mod repository;

pub use entity::{ResourceId, ResourceKind, SharedResource};
pub use repository::ResourceRepository;

#[cfg(test)]
pub use repository::MockResourceRepository;
