//! Team membership, access and exit-request endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, PropagationResponse};
use crate::domain::team::{ExitRequest, InvitePolicy, Member, Team, TeamRole, TeamSettings};
use crate::infrastructure::membership::{CreateTeamRequest, NewMember};

/// Request to create a new team
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamApiRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub default_role: Option<TeamRole>,
    #[serde(default)]
    pub invite_policy: Option<InvitePolicy>,
}

/// Request to add a member
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberApiRequest {
    pub id: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<TeamRole>,
}

/// Body carrying a role
#[derive(Debug, Clone, Deserialize)]
pub struct RoleApiRequest {
    pub role: TeamRole,
}

/// Body carrying an optional free-text reason
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReasonApiRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: TeamRole,
    pub joined_at: String,
}

impl From<&Member> for MemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id().to_string(),
            display_name: member.display_name().to_string(),
            email: member.email().to_string(),
            role: member.role(),
            joined_at: member.joined_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub settings: TeamSettings,
    pub members: Vec<MemberResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id().to_string(),
            name: team.name().to_string(),
            owner_id: team.owner_id().to_string(),
            settings: team.settings().clone(),
            members: team.members().map(MemberResponse::from).collect(),
            created_at: team.created_at().to_rfc3339(),
            updated_at: team.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListExitRequestsResponse {
    pub exit_requests: Vec<ExitRequest>,
    pub total: usize,
}

/// POST /v1/teams
pub async fn create_team(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Json(request): Json<CreateTeamApiRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    debug!(name = %request.name, caller = %caller.id(), "Creating team");

    let defaults = TeamSettings::default();
    let settings = TeamSettings {
        default_role: request.default_role.unwrap_or(defaults.default_role),
        invite_policy: request.invite_policy.unwrap_or(defaults.invite_policy),
    };

    let team = state
        .membership_service
        .create_team(
            &caller,
            CreateTeamRequest {
                id: request.id,
                name: request.name,
                settings: Some(settings),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// GET /v1/teams/{team_id}
pub async fn get_team(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(team_id): Path<String>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state.membership_service.get_team(&caller, &team_id).await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// POST /v1/teams/{team_id}/members
pub async fn add_member(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(team_id): Path<String>,
    Json(request): Json<AddMemberApiRequest>,
) -> Result<Json<PropagationResponse>, ApiError> {
    debug!(team_id = %team_id, member_id = %request.id, "Adding member");

    let member = NewMember {
        id: request.id,
        display_name: request.display_name,
        email: request.email,
        role: request.role,
    };

    let report = state
        .membership_service
        .add_member(&caller, &team_id, member)
        .await?;

    Ok(Json(report.into()))
}

/// DELETE /v1/teams/{team_id}/members/{member_id}
pub async fn remove_member(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path((team_id, member_id)): Path<(String, String)>,
) -> Result<Json<PropagationResponse>, ApiError> {
    let report = state
        .membership_service
        .remove_member(&caller, &team_id, &member_id)
        .await?;

    Ok(Json(report.into()))
}

/// PUT /v1/teams/{team_id}/members/{member_id}/role
pub async fn change_role(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path((team_id, member_id)): Path<(String, String)>,
    Json(request): Json<RoleApiRequest>,
) -> Result<Json<PropagationResponse>, ApiError> {
    let report = state
        .membership_service
        .change_role(&caller, &team_id, &member_id, request.role)
        .await?;

    Ok(Json(report.into()))
}

/// POST /v1/teams/{team_id}/access/{member_id}/grant
pub async fn grant_access(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path((team_id, member_id)): Path<(String, String)>,
    Json(request): Json<RoleApiRequest>,
) -> Result<Json<PropagationResponse>, ApiError> {
    let report = state
        .membership_service
        .grant_access(&caller, &team_id, &member_id, request.role)
        .await?;

    Ok(Json(report.into()))
}

/// POST /v1/teams/{team_id}/access/{member_id}/revoke
pub async fn revoke_access(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path((team_id, member_id)): Path<(String, String)>,
) -> Result<Json<PropagationResponse>, ApiError> {
    let report = state
        .membership_service
        .revoke_access(&caller, &team_id, &member_id)
        .await?;

    Ok(Json(report.into()))
}

/// POST /v1/teams/{team_id}/access/sync
pub async fn sync_all(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(team_id): Path<String>,
) -> Result<Json<PropagationResponse>, ApiError> {
    let report = state.membership_service.sync_all(&caller, &team_id).await?;
    Ok(Json(report.into()))
}

/// GET /v1/teams/{team_id}/exit-requests
pub async fn list_exit_requests(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(team_id): Path<String>,
) -> Result<Json<ListExitRequestsResponse>, ApiError> {
    let exit_requests = state
        .membership_service
        .list_exit_requests(&caller, &team_id)
        .await?;
    let total = exit_requests.len();

    Ok(Json(ListExitRequestsResponse {
        exit_requests,
        total,
    }))
}

/// POST /v1/teams/{team_id}/exit-requests
pub async fn request_exit(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(team_id): Path<String>,
    Json(request): Json<ReasonApiRequest>,
) -> Result<(StatusCode, Json<ExitRequest>), ApiError> {
    let exit_request = state
        .membership_service
        .request_exit(&caller, &team_id, request.reason)
        .await?;

    Ok((StatusCode::CREATED, Json(exit_request)))
}

/// DELETE /v1/teams/{team_id}/exit-requests
pub async fn cancel_exit(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(team_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .membership_service
        .cancel_exit(&caller, &team_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/teams/{team_id}/exit-requests/{member_id}/approve
pub async fn approve_exit(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path((team_id, member_id)): Path<(String, String)>,
) -> Result<Json<PropagationResponse>, ApiError> {
    let report = state
        .membership_service
        .approve_exit(&caller, &team_id, &member_id)
        .await?;

    Ok(Json(report.into()))
}

/// POST /v1/teams/{team_id}/exit-requests/{member_id}/reject
pub async fn reject_exit(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path((team_id, member_id)): Path<(String, String)>,
    Json(request): Json<ReasonApiRequest>,
) -> Result<Json<ExitRequest>, ApiError> {
    let exit_request = state
        .membership_service
        .reject_exit(&caller, &team_id, &member_id, request.reason)
        .await?;

    Ok(Json(exit_request))
}
