//! API service routes

use attendance::models::{
    GroupWithMembers, Member, NewGroup, NewMember, NewOrganization, NewSession, Organization,
    Session,
};
use attendance::store::with_timeout;
use attendance::validation::{validate_external_code, validate_name};
use attendance::{
    CheckInOutcome, CheckInRequest, CheckInResponse, EndSessionOutcome, EndSessionResponse,
    MemberAttendance, SessionAttendance,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{HealthResponse, OrgScope, ReplaceMembersRequest, ReportParams},
    state::{AppState, Store},
};

/// Create the router for the API service
pub fn create_router<S: Store>(state: AppState<S>) -> Router {
    let organizations = Router::new()
        .route("/organizations", post(create_organization::<S>))
        .route("/organizations/:organization_id", get(get_organization::<S>))
        .route(
            "/organizations/:organization_id/members",
            post(create_member::<S>),
        )
        .route(
            "/organizations/:organization_id/members/:member_id",
            delete(delete_member::<S>),
        )
        .route(
            "/organizations/:organization_id/groups",
            post(create_group::<S>).get(list_groups::<S>),
        )
        .route(
            "/organizations/:organization_id/groups/:group_id/members",
            put(replace_group_members::<S>),
        )
        .route(
            "/organizations/:organization_id/sessions",
            post(create_session::<S>),
        )
        .route(
            "/organizations/:organization_id/sessions/active",
            get(active_sessions::<S>),
        )
        .route(
            "/organizations/:organization_id/sessions/:session_id",
            delete(delete_session::<S>),
        )
        .route(
            "/organizations/:organization_id/sessions/:session_id/end",
            post(end_session::<S>),
        )
        .route(
            "/organizations/:organization_id/reports/attendance",
            get(attendance_report::<S>),
        );

    Router::new()
        .route("/health", get(health_check::<S>))
        .route(
            "/sessions/:session_id/check-in",
            post(check_in::<S>).head(check_in_probe::<S>),
        )
        .route(
            "/sessions/:session_id/attendance",
            get(session_attendance::<S>),
        )
        .merge(organizations)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check<S: Store>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let healthy = state.store.is_healthy().await;
    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        service: "attendance-api",
        store: if healthy { "reachable" } else { "unreachable" },
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Record a scanned code against a session
pub async fn check_in<S: Store>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<CheckInRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .recorder
        .record_check_in(payload.organization_id, session_id, &payload.external_code)
        .await?;

    let status = match &outcome {
        CheckInOutcome::Recorded { .. } => StatusCode::CREATED,
        CheckInOutcome::AlreadyRecorded { .. } => StatusCode::OK,
        CheckInOutcome::MemberNotFound { .. } | CheckInOutcome::SessionNotFound => {
            StatusCode::NOT_FOUND
        }
        CheckInOutcome::SessionInactive => StatusCode::CONFLICT,
    };

    Ok((status, Json(CheckInResponse::from(&outcome))))
}

/// Reachability target for kiosks
pub async fn check_in_probe<S: Store>(State(state): State<AppState<S>>) -> StatusCode {
    if state.store.is_healthy().await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn session_attendance<S: Store>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Uuid>,
    Query(scope): Query<OrgScope>,
) -> ApiResult<Json<SessionAttendance>> {
    state
        .aggregator
        .session_attendance(scope.organization_id, session_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

pub async fn attendance_report<S: Store>(
    State(state): State<AppState<S>>,
    Path(organization_id): Path<Uuid>,
    Query(params): Query<ReportParams>,
) -> ApiResult<Json<Vec<MemberAttendance>>> {
    let query = params.into_query().map_err(ApiError::BadRequest)?;
    require_organization(&state, organization_id).await?;

    let rows = state
        .aggregator
        .member_attendance_report(organization_id, query)
        .await?;
    Ok(Json(rows))
}

pub async fn create_session<S: Store>(
    State(state): State<AppState<S>>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<NewSession>,
) -> ApiResult<impl IntoResponse> {
    require_organization(&state, organization_id).await?;
    let session = with_timeout(
        state.store_timeout,
        state.store.create_session(organization_id, payload),
    )
    .await?;

    info!(
        "Session {} opened for {} in organization {}",
        session.id, session.date, organization_id
    );
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn active_sessions<S: Store>(
    State(state): State<AppState<S>>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Session>>> {
    let sessions = with_timeout(
        state.store_timeout,
        state.store.list_active_sessions(organization_id),
    )
    .await?;
    Ok(Json(sessions))
}

/// End a session; repeating the call reports `ended: false`
pub async fn end_session<S: Store>(
    State(state): State<AppState<S>>,
    Path((organization_id, session_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<EndSessionResponse>> {
    let outcome = with_timeout(
        state.store_timeout,
        state.store.end_session(organization_id, session_id),
    )
    .await?;

    match outcome {
        EndSessionOutcome::Ended(session) => Ok(Json(EndSessionResponse {
            ended: true,
            session,
        })),
        EndSessionOutcome::AlreadyEnded(session) => Ok(Json(EndSessionResponse {
            ended: false,
            session,
        })),
        EndSessionOutcome::NotFound => Err(ApiError::NotFound("Session not found".to_string())),
    }
}

/// Delete a session together with its attendance records
pub async fn delete_session<S: Store>(
    State(state): State<AppState<S>>,
    Path((organization_id, session_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let deleted = with_timeout(
        state.store_timeout,
        state.store.delete_session(organization_id, session_id),
    )
    .await?;

    if deleted {
        warn!(
            "Session {} deleted from organization {} with its attendance records",
            session_id, organization_id
        );
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Session not found".to_string()))
    }
}

pub async fn create_organization<S: Store>(
    State(state): State<AppState<S>>,
    Json(payload): Json<NewOrganization>,
) -> ApiResult<impl IntoResponse> {
    validate_name("Organization name", &payload.name).map_err(ApiError::BadRequest)?;
    if payload.code_length.is_some_and(|len| len <= 0) {
        return Err(ApiError::BadRequest(
            "Code length must be positive".to_string(),
        ));
    }

    let organization: Organization = with_timeout(
        state.store_timeout,
        state.store.create_organization(payload),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn get_organization<S: Store>(
    State(state): State<AppState<S>>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<Organization>> {
    require_organization(&state, organization_id).await.map(Json)
}

pub async fn create_member<S: Store>(
    State(state): State<AppState<S>>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<NewMember>,
) -> ApiResult<impl IntoResponse> {
    validate_external_code(&payload.external_code).map_err(ApiError::BadRequest)?;
    validate_name("First name", &payload.first_name).map_err(ApiError::BadRequest)?;
    validate_name("Last name", &payload.last_name).map_err(ApiError::BadRequest)?;
    require_organization(&state, organization_id).await?;

    let member: Member = with_timeout(
        state.store_timeout,
        state.store.create_member(organization_id, payload),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Delete a member together with their attendance history
pub async fn delete_member<S: Store>(
    State(state): State<AppState<S>>,
    Path((organization_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let deleted = with_timeout(
        state.store_timeout,
        state.store.delete_member(organization_id, member_id),
    )
    .await?;

    if deleted {
        warn!(
            "Member {} deleted from organization {} with their attendance records",
            member_id, organization_id
        );
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Member not found".to_string()))
    }
}

pub async fn create_group<S: Store>(
    State(state): State<AppState<S>>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<NewGroup>,
) -> ApiResult<impl IntoResponse> {
    validate_name("Group name", &payload.name).map_err(ApiError::BadRequest)?;
    require_organization(&state, organization_id).await?;

    let group: GroupWithMembers = with_timeout(
        state.store_timeout,
        state.store.create_group(organization_id, payload),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn list_groups<S: Store>(
    State(state): State<AppState<S>>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<Vec<GroupWithMembers>>> {
    let groups = with_timeout(
        state.store_timeout,
        state.store.list_groups(organization_id),
    )
    .await?;
    Ok(Json(groups))
}

pub async fn replace_group_members<S: Store>(
    State(state): State<AppState<S>>,
    Path((organization_id, group_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReplaceMembersRequest>,
) -> ApiResult<Json<GroupWithMembers>> {
    with_timeout(
        state.store_timeout,
        state
            .store
            .replace_group_members(organization_id, group_id, payload.member_ids),
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))
}

async fn require_organization<S: Store>(
    state: &AppState<S>,
    organization_id: Uuid,
) -> ApiResult<Organization> {
    with_timeout(
        state.store_timeout,
        state.store.find_organization(organization_id),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(store: &MemoryStore) -> Router {
        create_router(AppState::new(store.clone(), Duration::from_secs(2)))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(store: &MemoryStore, request: Request<Body>) -> (StatusCode, Value) {
        let response = app(store).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Organization with members 111 and 222 and an open session on "All"
    async fn seeded(store: &MemoryStore) -> (String, String) {
        let (_, org) = send(
            store,
            json_request("POST", "/organizations", json!({"name": "Soho Choir", "code_length": 3})),
        )
        .await;
        let org_id = org["id"].as_str().unwrap().to_string();

        for (code, first, last) in [("111", "Ada", "Lovelace"), ("222", "Grace", "Hopper")] {
            let (status, _) = send(
                store,
                json_request(
                    "POST",
                    &format!("/organizations/{}/members", org_id),
                    json!({"external_code": code, "first_name": first, "last_name": last}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, groups) = send(
            store,
            empty_request("GET", &format!("/organizations/{}/groups", org_id)),
        )
        .await;
        let all_id = groups[0]["id"].clone();
        assert_eq!(groups[0]["name"], "All");

        let (status, session) = send(
            store,
            json_request(
                "POST",
                &format!("/organizations/{}/sessions", org_id),
                json!({"group_ids": [all_id]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        (org_id, session["id"].as_str().unwrap().to_string())
    }

    fn check_in_request(org_id: &str, session_id: &str, code: &str) -> Request<Body> {
        json_request(
            "POST",
            &format!("/sessions/{}/check-in", session_id),
            json!({"external_code": code, "organization_id": org_id}),
        )
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = MemoryStore::new();
        let (status, body) = send(&store, empty_request("GET", "/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "attendance-api");
    }

    #[tokio::test]
    async fn test_check_in_statuses() {
        let store = MemoryStore::new();
        let (org_id, session_id) = seeded(&store).await;

        let (status, body) = send(&store, check_in_request(&org_id, &session_id, "111")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "recorded");
        assert_eq!(body["message"], "Welcome, Ada Lovelace!");
        assert!(body["check_in_time"].is_string());

        let (status, body) = send(&store, check_in_request(&org_id, &session_id, "111")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "already_recorded");

        let (status, body) = send(&store, check_in_request(&org_id, &session_id, "999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "member_not_found");
        assert_eq!(body["message"], "999 not found");

        let unknown = Uuid::new_v4().to_string();
        let (status, body) = send(&store, check_in_request(&org_id, &unknown, "111")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "session_not_found");
    }

    #[tokio::test]
    async fn test_check_in_after_end_is_conflict() {
        let store = MemoryStore::new();
        let (org_id, session_id) = seeded(&store).await;

        let end_uri = format!("/organizations/{}/sessions/{}/end", org_id, session_id);
        let (status, body) = send(&store, empty_request("POST", &end_uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ended"], true);
        assert_eq!(body["session"]["active"], false);

        let (_, body) = send(&store, empty_request("POST", &end_uri)).await;
        assert_eq!(body["ended"], false);

        let (status, body) = send(&store, check_in_request(&org_id, &session_id, "222")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "session_inactive");
    }

    #[tokio::test]
    async fn test_store_outage_is_service_unavailable() {
        let store = MemoryStore::new();
        let (org_id, session_id) = seeded(&store).await;
        store.set_available(false);

        let (status, body) = send(&store, check_in_request(&org_id, &session_id, "111")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());

        let probe = format!("/sessions/{}/check-in", session_id);
        let (status, _) = send(&store, empty_request("HEAD", &probe)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_probe_answers_no_content() {
        let store = MemoryStore::new();
        let probe = format!("/sessions/{}/check-in", Uuid::new_v4());

        let (status, _) = send(&store, empty_request("HEAD", &probe)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_session_attendance_view() {
        let store = MemoryStore::new();
        let (org_id, session_id) = seeded(&store).await;
        send(&store, check_in_request(&org_id, &session_id, "222")).await;

        let uri = format!(
            "/sessions/{}/attendance?organization_id={}",
            session_id, org_id
        );
        let (status, body) = send(&store, empty_request("GET", &uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_eligible"], 2);
        assert_eq!(body["present"][0]["member"]["external_code"], "222");
        assert_eq!(body["absent"][0]["external_code"], "111");

        let other = format!(
            "/sessions/{}/attendance?organization_id={}",
            session_id,
            Uuid::new_v4()
        );
        let (status, _) = send(&store, empty_request("GET", &other)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_attendance_report() {
        let store = MemoryStore::new();
        let (org_id, session_id) = seeded(&store).await;
        send(&store, check_in_request(&org_id, &session_id, "111")).await;

        let uri = format!("/organizations/{}/reports/attendance", org_id);
        let (status, body) = send(&store, empty_request("GET", &uri)).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        let ada = rows
            .iter()
            .find(|r| r["member"]["external_code"] == "111")
            .unwrap();
        assert_eq!(ada["attended"], 1);
        assert_eq!(ada["attendance_rate"], 100.0);

        let ended_only = format!("{}?ended_only=true", uri);
        let (_, body) = send(&store, empty_request("GET", &ended_only)).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_rejects_inverted_range() {
        let store = MemoryStore::new();
        let (org_id, _) = seeded(&store).await;

        let uri = format!(
            "/organizations/{}/reports/attendance?from=2026-05-02&to=2026-05-01",
            org_id
        );
        let (status, body) = send(&store, empty_request("GET", &uri)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("from"));
    }

    #[tokio::test]
    async fn test_duplicate_member_code_conflicts() {
        let store = MemoryStore::new();
        let (org_id, _) = seeded(&store).await;

        let (status, _) = send(
            &store,
            json_request(
                "POST",
                &format!("/organizations/{}/members", org_id),
                json!({"external_code": "111", "first_name": "Alan", "last_name": "Turing"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_member_code_is_bad_request() {
        let store = MemoryStore::new();
        let (org_id, _) = seeded(&store).await;

        let (status, _) = send(
            &store,
            json_request(
                "POST",
                &format!("/organizations/{}/members", org_id),
                json!({"external_code": "12 34", "first_name": "Alan", "last_name": "Turing"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_group_membership_replacement() {
        let store = MemoryStore::new();
        let (org_id, _) = seeded(&store).await;

        let (status, group) = send(
            &store,
            json_request(
                "POST",
                &format!("/organizations/{}/groups", org_id),
                json!({"name": "Sopranos"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(group["members"].as_array().unwrap().is_empty());

        let (_, groups) = send(
            &store,
            empty_request("GET", &format!("/organizations/{}/groups", org_id)),
        )
        .await;
        let ids: Vec<Value> = groups[0]["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].clone())
            .collect();

        let uri = format!(
            "/organizations/{}/groups/{}/members",
            org_id,
            group["id"].as_str().unwrap()
        );
        let (status, body) = send(&store, json_request("PUT", &uri, json!({"member_ids": ids}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["members"].as_array().unwrap().len(), 2);

        let missing = format!(
            "/organizations/{}/groups/{}/members",
            org_id,
            Uuid::new_v4()
        );
        let (status, _) = send(&store, json_request("PUT", &missing, json!({"member_ids": []}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_member() {
        let store = MemoryStore::new();
        let (org_id, _) = seeded(&store).await;
        let (_, groups) = send(
            &store,
            empty_request("GET", &format!("/organizations/{}/groups", org_id)),
        )
        .await;
        let member_id = groups[0]["members"][0]["id"].as_str().unwrap().to_string();
        let uri = format!("/organizations/{}/members/{}", org_id, member_id);

        let (status, _) = send(&store, empty_request("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&store, empty_request("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_all_group_membership_cannot_be_replaced() {
        let store = MemoryStore::new();
        let (org_id, session_id) = seeded(&store).await;
        let (_, groups) = send(
            &store,
            empty_request("GET", &format!("/organizations/{}/groups", org_id)),
        )
        .await;
        let all = &groups[0];
        let first = all["members"][0]["id"].clone();

        let uri = format!(
            "/organizations/{}/groups/{}/members",
            org_id,
            all["id"].as_str().unwrap()
        );
        let (status, body) =
            send(&store, json_request("PUT", &uri, json!({"member_ids": [first]}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());

        let view = format!(
            "/sessions/{}/attendance?organization_id={}",
            session_id, org_id
        );
        let (_, body) = send(&store, empty_request("GET", &view)).await;
        assert_eq!(body["total_eligible"], 2);
    }

    #[tokio::test]
    async fn test_delete_session_removes_its_attendance() {
        let store = MemoryStore::new();
        let (org_id, session_id) = seeded(&store).await;
        send(&store, check_in_request(&org_id, &session_id, "111")).await;
        let session = Uuid::parse_str(&session_id).unwrap();
        assert_eq!(store.record_count(session).await, 1);

        let uri = format!("/organizations/{}/sessions/{}", org_id, session_id);
        let (status, _) = send(&store, empty_request("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(store.record_count(session).await, 0);

        let view = format!(
            "/sessions/{}/attendance?organization_id={}",
            session_id, org_id
        );
        let (status, _) = send(&store, empty_request("GET", &view)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&store, empty_request("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_active_sessions_listing() {
        let store = MemoryStore::new();
        let (org_id, session_id) = seeded(&store).await;

        let uri = format!("/organizations/{}/sessions/active", org_id);
        let (_, body) = send(&store, empty_request("GET", &uri)).await;
        assert_eq!(body[0]["id"], session_id.as_str());

        send(
            &store,
            empty_request(
                "POST",
                &format!("/organizations/{}/sessions/{}/end", org_id, session_id),
            ),
        )
        .await;
        let (_, body) = send(&store, empty_request("GET", &uri)).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_with_foreign_group_is_not_found() {
        let store = MemoryStore::new();
        let (org_id, _) = seeded(&store).await;

        let (status, _) = send(
            &store,
            json_request(
                "POST",
                &format!("/organizations/{}/sessions", org_id),
                json!({"group_ids": [Uuid::new_v4()]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
