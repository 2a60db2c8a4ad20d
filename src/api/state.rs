//! Application state for shared services

use std::sync::Arc;

use crate::domain::caller::Caller;
use crate::domain::resource::SharedResource;
use crate::domain::team::{ExitRequest, Team, TeamRepository, TeamRole};
use crate::domain::DomainError;
use crate::infrastructure::access::PropagationReport;
use crate::infrastructure::auth::JwtService;
use crate::infrastructure::membership::{CreateTeamRequest, MembershipService, NewMember};
use crate::infrastructure::resource::{RegisterResourceRequest, ResourceService};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub membership_service: Arc<dyn MembershipServiceTrait>,
    pub resource_service: Arc<dyn ResourceServiceTrait>,
    pub jwt_service: Arc<JwtService>,
}

/// Trait for membership lifecycle operations
#[async_trait::async_trait]
pub trait MembershipServiceTrait: Send + Sync {
    async fn create_team(&self, caller: &Caller, request: CreateTeamRequest)
    -> Result<Team, DomainError>;
    async fn get_team(&self, caller: &Caller, team_id: &str) -> Result<Team, DomainError>;
    async fn add_member(
        &self,
        caller: &Caller,
        team_id: &str,
        member: NewMember,
    ) -> Result<PropagationReport, DomainError>;
    async fn remove_member(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
    ) -> Result<PropagationReport, DomainError>;
    async fn change_role(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
        role: TeamRole,
    ) -> Result<PropagationReport, DomainError>;
    async fn grant_access(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
        role: TeamRole,
    ) -> Result<PropagationReport, DomainError>;
    async fn revoke_access(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
    ) -> Result<PropagationReport, DomainError>;
    async fn sync_all(&self, caller: &Caller, team_id: &str)
    -> Result<PropagationReport, DomainError>;
    async fn request_exit(
        &self,
        caller: &Caller,
        team_id: &str,
        reason: Option<String>,
    ) -> Result<ExitRequest, DomainError>;
    async fn approve_exit(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
    ) -> Result<PropagationReport, DomainError>;
    async fn reject_exit(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
        reason: Option<String>,
    ) -> Result<ExitRequest, DomainError>;
    async fn cancel_exit(&self, caller: &Caller, team_id: &str) -> Result<(), DomainError>;
    async fn list_exit_requests(
        &self,
        caller: &Caller,
        team_id: &str,
    ) -> Result<Vec<ExitRequest>, DomainError>;
    async fn check_storage(&self) -> Result<(), DomainError>;
}

/// Trait for shared resource operations
#[async_trait::async_trait]
pub trait ResourceServiceTrait: Send + Sync {
    async fn register(
        &self,
        caller: &Caller,
        team_id: &str,
        request: RegisterResourceRequest,
    ) -> Result<SharedResource, DomainError>;
    async fn list_for_team(
        &self,
        caller: &Caller,
        team_id: &str,
    ) -> Result<Vec<SharedResource>, DomainError>;
}

#[async_trait::async_trait]
impl<R: TeamRepository + 'static> MembershipServiceTrait for MembershipService<R> {
    async fn create_team(
        &self,
        caller: &Caller,
        request: CreateTeamRequest,
    ) -> Result<Team, DomainError> {
        MembershipService::create_team(self, caller, request).await
    }

    async fn get_team(&self, caller: &Caller, team_id: &str) -> Result<Team, DomainError> {
        MembershipService::get_team(self, caller, team_id).await
    }

    async fn add_member(
        &self,
        caller: &Caller,
        team_id: &str,
        member: NewMember,
    ) -> Result<PropagationReport, DomainError> {
        MembershipService::add_member(self, caller, team_id, member).await
    }

    async fn remove_member(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
    ) -> Result<PropagationReport, DomainError> {
        MembershipService::remove_member(self, caller, team_id, member_id).await
    }

    async fn change_role(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
        role: TeamRole,
    ) -> Result<PropagationReport, DomainError> {
        MembershipService::change_role(self, caller, team_id, member_id, role).await
    }

    async fn grant_access(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
        role: TeamRole,
    ) -> Result<PropagationReport, DomainError> {
        MembershipService::grant_access(self, caller, team_id, member_id, role).await
    }

    async fn revoke_access(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
    ) -> Result<PropagationReport, DomainError> {
        MembershipService::revoke_access(self, caller, team_id, member_id).await
    }

    async fn sync_all(
        &self,
        caller: &Caller,
        team_id: &str,
    ) -> Result<PropagationReport, DomainError> {
        MembershipService::sync_all(self, caller, team_id).await
    }

    async fn request_exit(
        &self,
        caller: &Caller,
        team_id: &str,
        reason: Option<String>,
    ) -> Result<ExitRequest, DomainError> {
        MembershipService::request_exit(self, caller, team_id, reason).await
    }

    async fn approve_exit(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
    ) -> Result<PropagationReport, DomainError> {
        MembershipService::approve_exit(self, caller, team_id, member_id).await
    }

    async fn reject_exit(
        &self,
        caller: &Caller,
        team_id: &str,
        member_id: &str,
        reason: Option<String>,
    ) -> Result<ExitRequest, DomainError> {
        MembershipService::reject_exit(self, caller, team_id, member_id, reason).await
    }

    async fn cancel_exit(&self, caller: &Caller, team_id: &str) -> Result<(), DomainError> {
        MembershipService::cancel_exit(self, caller, team_id).await
    }

    async fn list_exit_requests(
        &self,
        caller: &Caller,
        team_id: &str,
    ) -> Result<Vec<ExitRequest>, DomainError> {
        MembershipService::list_exit_requests(self, caller, team_id).await
    }

    async fn check_storage(&self) -> Result<(), DomainError> {
        MembershipService::check_storage(self).await
    }
}

#[async_trait::async_trait]
impl<R: TeamRepository + 'static> ResourceServiceTrait for ResourceService<R> {
    async fn register(
        &self,
        caller: &Caller,
        team_id: &str,
        request: RegisterResourceRequest,
    ) -> Result<SharedResource, DomainError> {
        ResourceService::register(self, caller, team_id, request).await
    }

    async fn list_for_team(
        &self,
        caller: &Caller,
        team_id: &str,
    ) -> Result<Vec<SharedResource>, DomainError> {
        ResourceService::list_for_team(self, caller, team_id).await
    }
}

impl AppState {
    /// Create new application state with provided services
    pub fn new(
        membership_service: Arc<dyn MembershipServiceTrait>,
        resource_service: Arc<dyn ResourceServiceTrait>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            membership_service,
            resource_service,
            jwt_service,
        }
    }
}
