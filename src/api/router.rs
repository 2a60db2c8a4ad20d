use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::state::AppState;
use super::v1;

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::caller::Caller;
    use crate::domain::team::MemberId;
    use crate::infrastructure::auth::{JwtConfig, JwtService};
    use crate::infrastructure::storage::StorageFactory;
    use crate::{build_app_state, Repositories};

    const SECRET: &str = "router-test-secret";

    async fn app() -> Router {
        let repositories = Repositories::open(&StorageFactory::in_memory(), 50)
            .await
            .unwrap();
        let jwt = JwtService::new(JwtConfig::new(SECRET, 1));
        create_router_with_state(build_app_state(repositories, jwt))
    }

    fn token_for(member: &str) -> String {
        let caller = Caller::new(
            MemberId::new(member).unwrap(),
            member.to_uppercase(),
            format!("{}@example.com", member),
        );
        JwtService::new(JwtConfig::new(SECRET, 1))
            .issue(&caller)
            .unwrap()
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        member: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(member) = member {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token_for(member)),
            );
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    async fn seeded_app() -> Router {
        let app = app().await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/teams",
            Some("ana"),
            Some(json!({ "id": "core", "name": "Core" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/teams/core/resources",
            Some("ana"),
            Some(json!({ "kind": "file", "name": "plan.md" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        app
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = app().await;

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"][0]["name"], "team_storage");

        let (status, _) = send(&app, Method::GET, "/live", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = app().await;

        let (status, _) = send(&app, Method::GET, "/v1/teams/core", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_get_team() {
        let app = seeded_app().await;

        let (status, body) = send(&app, Method::GET, "/v1/teams/core", Some("ana"), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner_id"], "ana");
        assert_eq!(body["members"][0]["role"], "owner");
        assert_eq!(body["settings"]["default_role"], "member");
    }

    #[tokio::test]
    async fn test_add_member_propagates_to_resources() {
        let app = seeded_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/teams/core/members",
            Some("ana"),
            Some(json!({
                "id": "bo",
                "display_name": "Bo",
                "email": "bo@example.com",
                "role": "viewer"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], 1);
        assert_eq!(body["failed"], 0);

        let (_, body) = send(&app, Method::GET, "/v1/teams/core/resources", Some("bo"), None).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["resources"][0]["permissions"]["view"], json!(["bo"]));
    }

    #[tokio::test]
    async fn test_non_member_is_forbidden() {
        let app = seeded_app().await;

        let (status, body) = send(&app, Method::GET, "/v1/teams/core", Some("eve"), None).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["type"], "permission_error");
    }

    #[tokio::test]
    async fn test_unknown_team_is_not_found() {
        let app = app().await;

        let (status, _) = send(&app, Method::GET, "/v1/teams/ghost", Some("ana"), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_exit_request_flow() {
        let app = seeded_app().await;

        send(
            &app,
            Method::POST,
            "/v1/teams/core/members",
            Some("ana"),
            Some(json!({ "id": "bo", "display_name": "Bo", "email": "bo@example.com" })),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/teams/core/exit-requests",
            Some("bo"),
            Some(json!({ "reason": "moving on" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/teams/core/exit-requests",
            Some("bo"),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::GET,
            "/v1/teams/core/exit-requests",
            Some("ana"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/teams/core/exit-requests/bo/approve",
            Some("ana"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], 1);

        let (_, team) = send(&app, Method::GET, "/v1/teams/core", Some("ana"), None).await;
        assert_eq!(team["members"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_cannot_be_removed() {
        let app = seeded_app().await;

        let (status, _) = send(
            &app,
            Method::DELETE,
            "/v1/teams/core/members/ana",
            Some("ana"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_sync_converges() {
        let app = seeded_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/teams/core/access/sync",
            Some("ana"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], 0);
        assert_eq!(body["unchanged"], 1);
        assert_eq!(body["total"], 1);
    }
}
