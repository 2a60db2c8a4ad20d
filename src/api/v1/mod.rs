//! v1 API endpoints

pub mod resources;
pub mod teams;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/teams", post(teams::create_team))
        .route("/teams/{team_id}", get(teams::get_team))
        .route("/teams/{team_id}/members", post(teams::add_member))
        .route(
            "/teams/{team_id}/members/{member_id}",
            delete(teams::remove_member),
        )
        .route(
            "/teams/{team_id}/members/{member_id}/role",
            put(teams::change_role),
        )
        .route(
            "/teams/{team_id}/access/{member_id}/grant",
            post(teams::grant_access),
        )
        .route(
            "/teams/{team_id}/access/{member_id}/revoke",
            post(teams::revoke_access),
        )
        .route("/teams/{team_id}/access/sync", post(teams::sync_all))
        .route(
            "/teams/{team_id}/exit-requests",
            get(teams::list_exit_requests)
                .post(teams::request_exit)
                .delete(teams::cancel_exit),
        )
        .route(
            "/teams/{team_id}/exit-requests/{member_id}/approve",
            post(teams::approve_exit),
        )
        .route(
            "/teams/{team_id}/exit-requests/{member_id}/reject",
            post(teams::reject_exit),
        )
        .route(
            "/teams/{team_id}/resources",
            get(resources::list_resources).post(resources::register_resource),
        )
}
