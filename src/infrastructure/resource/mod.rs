//! Shared resource storage and registration

mod repository;
mod service;

pub use repository::StorageResourceRepository;
pub use service::{RegisterResourceRequest, ResourceService};
