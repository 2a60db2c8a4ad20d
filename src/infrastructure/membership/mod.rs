//! Membership lifecycle and the authorization rules around it

pub(crate) mod authorization;
mod service;

pub use service::{CreateTeamRequest, MembershipService, NewMember};
