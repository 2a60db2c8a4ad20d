//! Team domain module
//!
//! A team owns shared files and folders. Its membership map is the single
//! source of truth for who may access them and at which tier.

mod entity;
mod exit_request;
mod repository;
mod validation;

pub use entity::{InvitePolicy, Member, MemberId, Team, TeamId, TeamRole, TeamSettings};
pub use exit_request::{ExitRequest, ExitRequestStatus};
pub use repository::TeamRepository;
pub use validation::{
    validate_email, validate_member_id, validate_team_id, validate_team_name, TeamValidationError,
};
