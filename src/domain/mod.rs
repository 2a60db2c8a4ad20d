//! Domain layer - Core business logic and entities

pub mod access;
pub mod caller;
pub mod error;
pub mod resource;
pub mod storage;
pub mod team;

pub use access::{changed, tier_of, AccessMap, AclViolation, PermissionSets, PermissionTier};
pub use caller::Caller;
pub use error::DomainError;
pub use resource::{ResourceId, ResourceKind, ResourceRepository, SharedResource};
pub use storage::{BatchItemOutcome, Storage, StorageEntity, StorageKey};
pub use team::{
    ExitRequest, ExitRequestStatus, InvitePolicy, Member, MemberId, Team, TeamId, TeamRepository,
    TeamRole, TeamSettings,
};
