//! Shared file and folder endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::access::PermissionSets;
use crate::domain::resource::{ResourceKind, SharedResource};
use crate::infrastructure::resource::RegisterResourceRequest;

/// Request to register a shared resource
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResourceApiRequest {
    pub kind: ResourceKind,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceResponse {
    pub id: String,
    pub kind: ResourceKind,
    pub name: String,
    pub team_id: String,
    pub permissions: PermissionSets,
    pub last_modified: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
}

impl From<&SharedResource> for ResourceResponse {
    fn from(resource: &SharedResource) -> Self {
        Self {
            id: resource.id().to_string(),
            kind: resource.kind(),
            name: resource.name().to_string(),
            team_id: resource.team_id().to_string(),
            permissions: resource.permissions().clone(),
            last_modified: resource.last_modified().to_rfc3339(),
            last_modified_by: resource.last_modified_by().map(String::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResourcesResponse {
    pub resources: Vec<ResourceResponse>,
    pub total: usize,
}

/// GET /v1/teams/{team_id}/resources
pub async fn list_resources(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(team_id): Path<String>,
) -> Result<Json<ListResourcesResponse>, ApiError> {
    let resources = state
        .resource_service
        .list_for_team(&caller, &team_id)
        .await?;

    let resources: Vec<ResourceResponse> = resources.iter().map(ResourceResponse::from).collect();
    let total = resources.len();

    Ok(Json(ListResourcesResponse { resources, total }))
}

/// POST /v1/teams/{team_id}/resources
pub async fn register_resource(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(team_id): Path<String>,
    Json(request): Json<RegisterResourceApiRequest>,
) -> Result<(StatusCode, Json<ResourceResponse>), ApiError> {
    let resource = state
        .resource_service
        .register(
            &caller,
            &team_id,
            RegisterResourceRequest {
                kind: request.kind,
                name: request.name,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(&resource))))
}
