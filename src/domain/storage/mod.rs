//! Storage domain - Generic document storage abstraction layer

mod entity;
mod repository;

pub use entity::{StorageEntity, StorageKey};
pub use repository::{check_batch_size, BatchItemOutcome, Storage, DEFAULT_MAX_BATCH_SIZE};
