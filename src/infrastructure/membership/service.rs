//! Membership lifecycle: joins, removals, role changes and exit requests.
//!
//! Every operation commits the team document first and only then pushes the
//! change onto the team's shared resources. A failed push never undoes the
//! membership change; `sync_all` or the reconciler repairs it later.

use std::sync::Arc;

use tracing::{info, warn};

use super::authorization::{
    acting_role, load_team, parse_member_id, parse_team_id, require_manage, require_role,
};
use crate::domain::caller::Caller;
use crate::domain::team::{
    validate_email, ExitRequest, InvitePolicy, Member, MemberId, Team, TeamId, TeamRepository,
    TeamRole, TeamSettings,
};
use crate::domain::DomainError;
use crate::infrastructure::access::{AccessPropagator, PropagationOp, PropagationReport};

/// Request for creating a new team
#[derive(Debug, Clone, Default)]
pub struct CreateTeamRequest {
    /// Generated when absent
    pub id: Option<String>,
    pub name: String,
    pub settings: Option<TeamSettings>,
}

/// A user joining a team
#[derive(Debug, Clone)]
pub struct NewMember {
    pub id: String,
    pub display_name: String,
    pub email: String,
    /// Falls back to the team's default role
    pub role: Option<TeamRole>,
}

/// Membership lifecycle service
#[derive(Debug)]
pub struct MembershipService<R: TeamRepository> {
    teams: Arc<R>,
    propagator: AccessPropagator,
}

impl<R: TeamRepository> MembershipService<R> {
    pub fn new(teams: Arc<R>, propagator: AccessPropagator) -> Self {
        Self { teams, propagator }
    }

    /// Create a team owned by the caller
    pub async fn create_team(
        &self,
        caller: &Caller,
        request: CreateTeamRequest,
    ) -> Result<Team, DomainError> {
        let team_id = match request.id.as_deref() {
            Some(raw) => parse_team_id(raw)?,
            None => TeamId::generate(),
        };

        let settings = request.settings.unwrap_or_default();
        if settings.default_role == TeamRole::Owner {
            return Err(DomainError::validation("The default role cannot be owner"));
        }

        let owner = Member::new(
            caller.id().clone(),
            &caller.display_name,
            &caller.email,
            TeamRole::Owner,
        );

        let team = Team::new(team_id, &request.name, owner)
            .map_err(|e| DomainError::validation(e.to_string()))?
            .with_settings(settings);

        info!(team_id = %team.id(), owner = %caller.id(), "Creating team");
        self.teams.create(team).await
    }

    /// Fetch a team the caller belongs to
    pub async fn get_team(&self, caller: &Caller, team_id: &str) -> Result<Team, DomainError> {
        let team = load_team(self.teams.as_ref(), team_id).await?;
        acting_role(&team, caller)?;
        Ok(team)
    }

    /// Add a member and grant them access to every team resource
    pub async fn add_member(
        &self,
        caller: &Caller,
        team_id: &str,
        new_member: NewMember,
    ) -> Result<PropagationReport, DomainError> {
        let mut team = load_team(self.teams.as_ref(), team_id).await?;

        let member_id = parse_member_id(&new_member.id)?;
        let role = new_member.role.unwrap_or(team.settings().default_role);

        if role == TeamRole::Owner {
            return Err(DomainError::forbidden("The owner role cannot be assigned"));
        }

        Self::check_invite(&team, caller, role)?;

        if new_member.display_name.trim().is_empty() {
            return Err(DomainError::validation("Display name cannot be empty"));
        }
        validate_email(&new_member.email).map_err(|e| DomainError::validation(e.to_string()))?;

        team.insert_member(Member::new(
            member_id.clone(),
            new_member.display_name,
            new_member.email,
            role,
        ))?;
        let team = self.teams.update(team).await?;

        info!(team_id = %team.id(), member_id = %member_id, role = %role, by = %caller.id(), "Member added");

        self.propagate(team.id(), PropagationOp::Grant { member_id, role }, caller)
            .await
    }

    fn check_invite(team: &Team, caller: &Caller, role: TeamRole) -> Result<(), DomainError> {
        match team.settings().invite_policy {
            InvitePolicy::AdminsOnly => require_manage(team, caller, role).map(|_| ()),
            InvitePolicy::Members => {
                let acting = require_role(team, caller, TeamRole::Member)?;

                if role > acting {
                    return Err(DomainError::forbidden(format!(
                        "A {} cannot invite at the {} role",
                        acting, role
                    )));
                }

                if role == TeamRole::Admin {
                    require_role(team, caller, TeamRole::Owner)?;
                }

                Ok(())
            }
        }
    }

    /// Remove someone else from the team and revoke their access
    pub async fn remove_member(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
    ) -> Result<PropagationReport, DomainError> {
        let mut team = load_team(self.teams.as_ref(), team_id).await?;
        let member_id = parse_member_id(member_id)?;

        Self::check_removal(&team, caller, &member_id)?;

        team.remove_member(&member_id)?;
        let team = self.teams.update(team).await?;

        info!(team_id = %team.id(), member_id = %member_id, by = %caller.id(), "Member removed");

        self.propagate(team.id(), PropagationOp::Revoke { member_id }, caller)
            .await
    }

    fn check_removal(
        team: &Team,
        caller: &Caller,
        member_id: &MemberId,
    ) -> Result<(), DomainError> {
        acting_role(team, caller)?;

        if team.is_owner(member_id) {
            return Err(DomainError::forbidden("The team owner cannot be removed"));
        }

        if member_id == caller.id() {
            return Err(DomainError::forbidden(
                "Members cannot remove themselves, request an exit instead",
            ));
        }

        let target = team.role_of(member_id).ok_or_else(|| {
            DomainError::not_found(format!(
                "'{}' is not a member of team '{}'",
                member_id,
                team.id()
            ))
        })?;

        require_manage(team, caller, target)?;
        Ok(())
    }

    /// Owner-only role change, followed by a grant at the new tier
    pub async fn change_role(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
        new_role: TeamRole,
    ) -> Result<PropagationReport, DomainError> {
        let mut team = load_team(self.teams.as_ref(), team_id).await?;
        let member_id = parse_member_id(member_id)?;

        require_role(&team, caller, TeamRole::Owner)?;

        let previous = team.set_role(&member_id, new_role)?;
        let team = self.teams.update(team).await?;

        info!(
            team_id = %team.id(),
            member_id = %member_id,
            from = %previous,
            to = %new_role,
            "Role changed"
        );

        let op = PropagationOp::Grant {
            member_id,
            role: new_role,
        };
        self.propagate(team.id(), op, caller).await
    }

    /// Re-push a member's current tier onto every resource.
    ///
    /// `role` must match the stored role; changing it goes through `change_role`.
    pub async fn grant_access(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
        role: TeamRole,
    ) -> Result<PropagationReport, DomainError> {
        let team = load_team(self.teams.as_ref(), team_id).await?;
        let member_id = parse_member_id(member_id)?;

        require_role(&team, caller, TeamRole::Admin)?;

        let stored = team.role_of(&member_id).ok_or_else(|| {
            DomainError::not_found(format!(
                "'{}' is not a member of team '{}'",
                member_id,
                team.id()
            ))
        })?;

        if stored != role {
            return Err(DomainError::conflict(format!(
                "'{}' is {}, not {}; use a role change instead",
                member_id, stored, role
            )));
        }

        self.propagate(team.id(), PropagationOp::Grant { member_id, role }, caller)
            .await
    }

    /// Strip a user from every resource, removing them from the team first
    /// when they are still a member
    pub async fn revoke_access(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
    ) -> Result<PropagationReport, DomainError> {
        let mut team = load_team(self.teams.as_ref(), team_id).await?;
        let member_id = parse_member_id(member_id)?;

        require_role(&team, caller, TeamRole::Admin)?;

        if team.is_owner(&member_id) {
            return Err(DomainError::forbidden("The team owner's access cannot be revoked"));
        }

        if team.member(&member_id).is_some() {
            Self::check_removal(&team, caller, &member_id)?;
            team.remove_member(&member_id)?;
            team = self.teams.update(team).await?;

            info!(team_id = %team.id(), member_id = %member_id, by = %caller.id(), "Member removed for revocation");
        }

        self.propagate(team.id(), PropagationOp::Revoke { member_id }, caller)
            .await
    }

    /// Rebuild every resource ACL from the current membership
    pub async fn sync_all(
        &self,
        caller: &Caller,
        team_id: &str,
    ) -> Result<PropagationReport, DomainError> {
        let team = load_team(self.teams.as_ref(), team_id).await?;
        require_role(&team, caller, TeamRole::Admin)?;

        info!(team_id = %team.id(), by = %caller.id(), "Full resync requested");

        let op = PropagationOp::FullResync {
            members: team.membership_roles(),
        };
        self.propagator
            .propagate(team.id(), &op, caller.id().as_str())
            .await
    }

    /// Ask to leave the team
    pub async fn request_exit(
        &self,
        caller: &Caller,
        team_id: &str,
        reason: Option<String>,
    ) -> Result<ExitRequest, DomainError> {
        let mut team = load_team(self.teams.as_ref(), team_id).await?;

        let member = team.member(caller.id()).cloned().ok_or_else(|| {
            DomainError::forbidden(format!(
                "'{}' is not a member of team '{}'",
                caller.id(),
                team.id()
            ))
        })?;

        let request = ExitRequest::new(
            member.id().clone(),
            member.display_name(),
            member.email(),
            reason,
        );
        team.open_exit_request(request.clone())?;
        let team = self.teams.update(team).await?;

        info!(team_id = %team.id(), member_id = %caller.id(), "Exit requested");
        Ok(request)
    }

    /// Accept a pending exit: the member is removed and loses all access
    pub async fn approve_exit(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
    ) -> Result<PropagationReport, DomainError> {
        let mut team = load_team(self.teams.as_ref(), team_id).await?;
        let member_id = parse_member_id(member_id)?;

        Self::check_resolver(&team, caller, &member_id)?;

        team.approve_exit_request(&member_id, caller.id())?;
        let team = self.teams.update(team).await?;

        info!(team_id = %team.id(), member_id = %member_id, by = %caller.id(), "Exit approved");

        self.propagate(team.id(), PropagationOp::Revoke { member_id }, caller)
            .await
    }

    /// Turn down a pending exit; the request is kept as rejected
    pub async fn reject_exit(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
        reason: Option<String>,
    ) -> Result<ExitRequest, DomainError> {
        let mut team = load_team(self.teams.as_ref(), team_id).await?;
        let member_id = parse_member_id(member_id)?;

        Self::check_resolver(&team, caller, &member_id)?;

        let reason = reason.filter(|r| !r.trim().is_empty());
        let request = team
            .reject_exit_request(&member_id, caller.id(), reason)?
            .clone();
        self.teams.update(team).await?;

        info!(team_id = %team_id, member_id = %member_id, by = %caller.id(), "Exit rejected");
        Ok(request)
    }

    fn check_resolver(
        team: &Team,
        caller: &Caller,
        member_id: &MemberId,
    ) -> Result<(), DomainError> {
        require_role(team, caller, TeamRole::Admin)?;

        let requester = team.role_of(member_id).ok_or_else(|| {
            DomainError::not_found(format!(
                "No exit request from '{}' in team '{}'",
                member_id,
                team.id()
            ))
        })?;

        require_manage(team, caller, requester)?;
        Ok(())
    }

    /// Withdraw the caller's own pending exit request
    pub async fn cancel_exit(&self, caller: &Caller, team_id: &str) -> Result<(), DomainError> {
        let mut team = load_team(self.teams.as_ref(), team_id).await?;
        acting_role(&team, caller)?;

        team.cancel_exit_request(caller.id())?;
        self.teams.update(team).await?;

        info!(team_id = %team_id, member_id = %caller.id(), "Exit request cancelled");
        Ok(())
    }

    /// All exit requests of a team, pending and rejected
    pub async fn list_exit_requests(
        &self,
        caller: &Caller,
        team_id: &str,
    ) -> Result<Vec<ExitRequest>, DomainError> {
        let team = load_team(self.teams.as_ref(), team_id).await?;
        require_role(&team, caller, TeamRole::Admin)?;

        Ok(team.exit_requests().cloned().collect())
    }

    /// Round trip to team storage for readiness checks
    pub async fn check_storage(&self) -> Result<(), DomainError> {
        self.teams.exists(&TeamId::generate()).await.map(|_| ())
    }

    /// Runs after the membership commit; a load failure is logged and
    /// yields an empty report
    async fn propagate(
        &self,
        team_id: &TeamId,
        op: PropagationOp,
        caller: &Caller,
    ) -> Result<PropagationReport, DomainError> {
        match self
            .propagator
            .propagate(team_id, &op, caller.id().as_str())
            .await
        {
            Ok(report) => {
                if report.failed_count() > 0 {
                    warn!(
                        team_id = %team_id,
                        op = op.name(),
                        failed = report.failed_count(),
                        "Propagation partially failed, run a sync to repair"
                    );
                }
                Ok(report)
            }
            Err(e) => {
                warn!(team_id = %team_id, op = op.name(), error = %e, "Propagation could not start");
                Ok(PropagationReport::default())
            }
        }
    }
}
