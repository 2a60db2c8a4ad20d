//! Rank checks shared by the membership and resource services

use crate::domain::caller::Caller;
use crate::domain::team::{MemberId, Team, TeamId, TeamRepository, TeamRole};
use crate::domain::DomainError;

pub(crate) fn parse_team_id(raw: &str) -> Result<TeamId, DomainError> {
    TeamId::new(raw).map_err(|e| DomainError::invalid_id(e.to_string()))
}

pub(crate) fn parse_member_id(raw: &str) -> Result<MemberId, DomainError> {
    MemberId::new(raw).map_err(|e| DomainError::invalid_id(e.to_string()))
}

/// Load a team and verify its owner invariants
pub(crate) async fn load_team<R: TeamRepository + ?Sized>(
    teams: &R,
    team_id: &str,
) -> Result<Team, DomainError> {
    let id = parse_team_id(team_id)?;

    let team = teams
        .get(&id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))?;

    team.check_invariants()?;
    Ok(team)
}

/// The caller's role, or Forbidden when the caller is not a member
pub(crate) fn acting_role(team: &Team, caller: &Caller) -> Result<TeamRole, DomainError> {
    team.role_of(caller.id()).ok_or_else(|| {
        DomainError::forbidden(format!(
            "'{}' is not a member of team '{}'",
            caller.id(),
            team.id()
        ))
    })
}

/// Require the caller to hold at least `required`
pub(crate) fn require_role(
    team: &Team,
    caller: &Caller,
    required: TeamRole,
) -> Result<TeamRole, DomainError> {
    let role = acting_role(team, caller)?;

    if !role.at_least(required) {
        return Err(DomainError::forbidden(format!(
            "This action requires the {} role, '{}' is {}",
            required,
            caller.id(),
            role
        )));
    }

    Ok(role)
}

/// Require the caller to outrank a member holding `target`
pub(crate) fn require_manage(
    team: &Team,
    caller: &Caller,
    target: TeamRole,
) -> Result<TeamRole, DomainError> {
    if target == TeamRole::Owner {
        return Err(DomainError::forbidden("The team owner cannot be managed"));
    }

    require_role(team, caller, target.required_to_manage())
}
