//! Registration and listing of a team's shared files and folders

use std::sync::Arc;

use tracing::info;

use crate::domain::access::{AccessMap, PermissionSets, PermissionTier};
use crate::domain::caller::Caller;
use crate::domain::resource::{ResourceId, ResourceKind, ResourceRepository, SharedResource};
use crate::domain::team::TeamRepository;
use crate::domain::DomainError;
use crate::infrastructure::membership::authorization::{acting_role, load_team};

/// Request for registering a shared resource
#[derive(Debug, Clone)]
pub struct RegisterResourceRequest {
    pub kind: ResourceKind,
    pub name: String,
}

/// Resource service for shared files and folders
pub struct ResourceService<R: TeamRepository> {
    teams: Arc<R>,
    resources: Arc<dyn ResourceRepository>,
}

impl<R: TeamRepository> std::fmt::Debug for ResourceService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("teams", &self.teams)
            .finish_non_exhaustive()
    }
}

impl<R: TeamRepository> ResourceService<R> {
    pub fn new(teams: Arc<R>, resources: Arc<dyn ResourceRepository>) -> Self {
        Self { teams, resources }
    }

    /// Register a resource whose ACL starts out matching the membership
    pub async fn register(
        &self,
        caller: &Caller,
        team_id: &str,
        request: RegisterResourceRequest,
    ) -> Result<SharedResource, DomainError> {
        let team = load_team(self.teams.as_ref(), team_id).await?;
        let role = acting_role(&team, caller)?;

        if PermissionTier::for_role(role) < PermissionTier::Edit {
            return Err(DomainError::forbidden(format!(
                "A {} cannot add resources to team '{}'",
                role,
                team.id()
            )));
        }

        let permissions = AccessMap::recompute(&team.membership_roles()).to_permission_sets();
        let resource = SharedResource::new(
            ResourceId::generate(),
            request.kind,
            request.name,
            team.id().clone(),
            PermissionSets::new(),
        )?
        .with_permissions(permissions, caller.id().as_str());

        info!(
            team_id = %team.id(),
            resource_id = %resource.id(),
            kind = %resource.kind(),
            by = %caller.id(),
            "Registering resource"
        );

        self.resources.create(resource).await
    }

    /// Files then folders of a team the caller belongs to
    pub async fn list_for_team(
        &self,
        caller: &Caller,
        team_id: &str,
    ) -> Result<Vec<SharedResource>, DomainError> {
        let team = load_team(self.teams.as_ref(), team_id).await?;
        acting_role(&team, caller)?;

        let mut resources = Vec::new();
        for kind in ResourceKind::ALL {
            resources.extend(self.resources.list_for_team(kind, team.id()).await?);
        }

        Ok(resources)
    }
}
