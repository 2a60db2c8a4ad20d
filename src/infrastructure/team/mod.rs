//! Team infrastructure implementations

mod repository;

pub use repository::StorageTeamRepository;
