//! HTTP surface: session lifecycle, the Understanding/Mapper/Composer/
//! Refiner/Search pipeline, and ambient operational endpoints (spec.md §6).

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;
use autolot_core::{ComposedQuery, MappedQuery, ParsedQuery};

pub fn create_router(state: AppState) -> Router {
    let (cors_origins, cors_enabled, deadline_ms) = {
        let settings = state.settings.read();
        (settings.server.cors_origins.clone(), settings.server.cors_enabled, settings.server.request_deadline_ms)
    };
    let cors_layer = build_cors_layer(&cors_origins, cors_enabled);

    Router::new()
        .route("/session", post(create_session))
        .route("/session/:id", get(get_session))
        .route("/session/:id", delete(delete_session))
        .route("/session/:id/history", get(session_history))
        .route("/query/parse", post(parse_query))
        .route("/query/compose", post(compose_query))
        .route("/query/refine", post(refine_query))
        .route("/search", post(search))
        .route("/search/explain", post(explain))
        .route("/vehicles/:id", get(get_vehicle))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(crate::metrics::metrics_handler))
        .route("/admin/reload-config", post(reload_config))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_millis(deadline_ms)))
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (not for production)");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!("no CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin, "invalid CORS origin, skipping");
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::error!("all configured CORS origins are invalid, falling back to localhost");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .allow_credentials(true)
}

/// Resolves the caller's rate-limit key and ticks their request history.
/// Absent `X-Session-Id` is tracked as a single shared "anonymous" bucket.
fn touch_caller(state: &AppState, headers: &HeaderMap) -> (String, Vec<chrono::DateTime<chrono::Utc>>) {
    let key = headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();
    let history = state.request_tracker.touch(&key, chrono::Utc::now());
    (key, history)
}

fn guardrail_check(state: &AppState, headers: &HeaderMap, utterance: &str) -> Result<usize, ApiError> {
    let (_, history) = touch_caller(state, headers);
    let verdict = state.guardrail.check(utterance, &history, chrono::Utc::now());
    if verdict.is_blocked() {
        if let Some(category) = verdict.category {
            crate::metrics::record_guardrail_decision(&format!("{:?}", category));
        }
        return Err(ApiError::from_guardrail(&verdict));
    }
    Ok(verdict.result_cap.unwrap_or(usize::MAX))
}

#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize))]
struct CreateSessionResponse {
    #[serde(rename = "sessionId")]
    session_id: String,
}

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let session_id = state.sessions.create();
    Json(CreateSessionResponse { session_id })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<autolot_core::ConversationSession>, ApiError> {
    let session = state.sessions.get(&id).map_err(ApiError::from)?;
    Ok(Json(session))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.sessions.clear(&id);
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
struct HistoryParams {
    max: Option<usize>,
}

async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<autolot_core::ConversationMessage>>, ApiError> {
    let max = params.max.unwrap_or(20);
    let history = state.sessions.history(&id, max).map_err(ApiError::from)?;
    Ok(Json(history))
}

#[derive(Deserialize)]
struct ParseQueryRequest {
    utterance: String,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn parse_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ParseQueryRequest>,
) -> Result<Json<ParsedQuery>, ApiError> {
    guardrail_check(&state, &headers, &request.utterance)?;

    let previous_utterance = match &request.session_id {
        Some(id) => state
            .sessions
            .history(id, 5)
            .ok()
            .and_then(|history| history.into_iter().rev().find(|m| m.role == autolot_core::Role::User))
            .map(|message| message.content),
        None => None,
    };

    let parsed = state.understanding.understand(&request.utterance, previous_utterance.as_deref()).await;

    if let Some(session_id) = &request.session_id {
        let message = autolot_core::ConversationMessage {
            id: uuid::Uuid::new_v4().to_string(),
            role: autolot_core::Role::User,
            content: request.utterance.clone(),
            timestamp: chrono::Utc::now(),
            applied_constraints: None,
            result_count: None,
            top_ids: None,
        };
        state.sessions.append_message(session_id, message).map_err(ApiError::from)?;
    }

    Ok(Json(parsed))
}

#[derive(Deserialize)]
struct ComposeQueryRequest {
    #[serde(rename = "parsedQuery")]
    parsed_query: ParsedQuery,
}

async fn compose_query(
    State(state): State<AppState>,
    Json(request): Json<ComposeQueryRequest>,
) -> Result<Json<ComposedQuery>, ApiError> {
    let mapped: MappedQuery = state.mapper.map(&request.parsed_query.entities);
    let composed = state.composer.compose(&mapped);
    Ok(Json(composed))
}

#[derive(Deserialize)]
struct RefineQueryRequest {
    utterance: String,
    #[serde(rename = "sessionId")]
    session_id: String,
}

async fn refine_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RefineQueryRequest>,
) -> Result<Json<autolot_query::RefineOutcome>, ApiError> {
    guardrail_check(&state, &headers, &request.utterance)?;

    let session = state.sessions.get(&request.session_id).map_err(ApiError::from)?;
    let parsed = state.understanding.understand(&request.utterance, None).await;
    let mapped = state.mapper.map(&parsed.entities);

    let outcome = state.refiner.refine(&request.utterance, &mapped.constraints, &session.current_search_state);
    Ok(Json(outcome))
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(rename = "composedQuery")]
    composed_query: ComposedQuery,
    #[serde(rename = "maxResults", default = "default_max_results")]
    max_results: usize,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

fn default_max_results() -> usize {
    20
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<autolot_core::VehicleResult>,
    strategy: autolot_core::SearchStrategy,
    #[serde(rename = "durationMs")]
    duration_ms: u128,
    #[serde(rename = "relaxationHint", skip_serializing_if = "Option::is_none")]
    relaxation_hint: Option<autolot_core::RelaxationHint>,
}

async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let result_cap = guardrail_check(&state, &headers, "")?;

    if !(1..=100).contains(&request.max_results) {
        return Err(ApiError::validation("maxResults must be between 1 and 100"));
    }
    if !request.composed_query.is_valid() {
        return Err(ApiError::validation("composed query has unresolved conflicts or an empty filter"));
    }

    let top_k = request.max_results.min(result_cap);
    let started = std::time::Instant::now();
    let (results, strategy, relaxation_hint) = state
        .orchestrator
        .search(&request.composed_query, top_k)
        .await
        .map_err(ApiError::from)?;

    let ranked = state.ranker.rank(results, &request.composed_query);
    let elapsed = started.elapsed();
    crate::metrics::record_search(&format!("{:?}", strategy.strategy_type), elapsed.as_secs_f64());
    let duration_ms = elapsed.as_millis();

    if let Some(session_id) = &request.session_id {
        let top_ids: Vec<String> = ranked.iter().take(5).map(|r| r.vehicle.id.clone()).collect();
        let last_results: Vec<autolot_core::LastResultRef> = ranked
            .iter()
            .take(5)
            .map(|r| autolot_core::LastResultRef { id: r.vehicle.id.clone(), price: r.vehicle.price, mileage: r.vehicle.mileage })
            .collect();
        let active_filters = request
            .composed_query
            .all_constraints()
            .map(|c| (c.field_name.clone(), c.clone()))
            .collect();
        let _ = state.sessions.update_search_state(
            session_id,
            autolot_core::SearchState { active_filters, last_results, last_strategy: Some(strategy.clone()) },
        );
        let message = autolot_core::ConversationMessage {
            id: uuid::Uuid::new_v4().to_string(),
            role: autolot_core::Role::Assistant,
            content: format!("{} results", ranked.len()),
            timestamp: chrono::Utc::now(),
            applied_constraints: None,
            result_count: Some(ranked.len()),
            top_ids: Some(top_ids),
        };
        let _ = state.sessions.append_message(session_id, message);
    }

    Ok(Json(SearchResponse { results: ranked, strategy, duration_ms, relaxation_hint }))
}

#[derive(Deserialize)]
struct ExplainRequest {
    #[serde(rename = "vehicleId")]
    vehicle_id: String,
    #[serde(rename = "parsedQuery")]
    parsed_query: ParsedQuery,
}

async fn explain(
    State(state): State<AppState>,
    Json(request): Json<ExplainRequest>,
) -> Result<Json<autolot_core::ExplainedScore>, ApiError> {
    let vehicle = state
        .search_index
        .get(&request.vehicle_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::new(ErrorCode::ValidationError, "vehicle not found"))?;

    let mapped = state.mapper.map(&request.parsed_query.entities);
    let constraints = mapped.constraints;
    let concept_terms: Vec<String> = request
        .parsed_query
        .entities
        .iter()
        .filter(|e| e.entity_type == autolot_core::EntityType::QualitativeTerm)
        .map(|e| e.raw_value.clone())
        .collect();

    let explained = state.concept_mapper.explain(&vehicle, &constraints, &concept_terms);
    Ok(Json(explained))
}

async fn get_vehicle(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<autolot_core::Vehicle>, ApiError> {
    let vehicle = state
        .search_index
        .get(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::new(ErrorCode::ValidationError, "vehicle not found"))?;
    Ok(Json(vehicle))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") })))
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let mut ready = true;
    let mut checks = serde_json::Map::new();

    let dims_ok = state.embedder.dimensions() == state.search_index.vector_dimensions();
    checks.insert("vectorDimensions".to_string(), serde_json::json!({ "status": if dims_ok { "ok" } else { "mismatch" } }));
    ready &= dims_ok;

    checks.insert("sessions".to_string(), serde_json::json!({ "status": "ok" }));

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(serde_json::json!({ "status": if ready { "ready" } else { "not_ready" }, "checks": checks })))
}

async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_settings() {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "success" }))),
        Err(e) => {
            tracing::error!(error = %e, "config reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "status": "error", "message": e })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_config::Settings;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn router_builds_from_default_settings() {
        let state = AppState::new(Settings::default());
        let _ = create_router(state);
    }

    fn test_router() -> Router {
        create_router(AppState::new(Settings::default()))
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn empty_composed_query() -> ComposedQuery {
        ComposedQuery {
            groups: Vec::new(),
            inter_group_op: autolot_core::LogicalOp::And,
            warnings: Vec::new(),
            has_conflicts: false,
            filter_expression: String::new(),
            query_type: autolot_core::QueryType::Simple,
        }
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let app = test_router();

        let response = app.clone().oneshot(Request::builder().method("POST").uri("/session").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created: CreateSessionResponse = json_body(response).await;

        let response = app
            .clone()
            .oneshot(Request::builder().method("GET").uri(format!("/session/{}", created.session_id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::builder().method("DELETE").uri(format!("/session/{}", created.session_id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(Request::builder().method("GET").uri(format!("/session/{}", created.session_id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_session_unknown_id_is_not_found() {
        let app = test_router();
        let response =
            app.oneshot(Request::builder().method("GET").uri("/session/does-not-exist").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_and_ready_respond() {
        let app = test_router();

        let response = app.clone().oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn search_rejects_out_of_range_max_results() {
        let app = test_router();
        let composed = empty_composed_query();
        let body = serde_json::json!({ "composedQuery": composed, "maxResults": 0 });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/search")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_rejects_empty_composed_query() {
        let app = test_router();
        let composed = empty_composed_query();
        let body = serde_json::json!({ "composedQuery": composed });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/search")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn compose_query_with_no_entities_yields_empty_filter() {
        let app = test_router();
        let parsed = ParsedQuery::new("show me cars", autolot_core::ClassifiedIntent::Search, 0.9);
        let body = serde_json::json!({ "parsedQuery": parsed });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/query/compose")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let composed: ComposedQuery = json_body(response).await;
        assert!(!composed.is_valid());
    }

    #[tokio::test]
    async fn refine_unknown_session_is_not_found() {
        let app = test_router();
        let body = serde_json::json!({ "utterance": "under 20000", "sessionId": "does-not-exist" });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/query/refine")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
