//! Access domain - tiers, stored permission sets and ACL computation
//!
//! Everything here is pure. Persisting computed ACLs is the propagator's job.

mod acl;
mod permission_set;
mod tier;

pub use acl::{AccessMap, AclViolation};
pub use permission_set::{changed, PermissionSets};
pub use tier::{tier_of, PermissionTier};
