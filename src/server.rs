//! HTTP server for Character Tally.
//!
//! A thin JSON layer over [`CharacterService`]. Every handler parses its
//! input, calls one service operation and maps [`TallyError`] to a status
//! code.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/sources` | Per-source availability |
//! | `GET`  | `/characters/random?source=` | Fetch a random character |
//! | `POST` | `/characters/vote` | Record a like or dislike (201) |
//! | `GET`  | `/characters?source&sortBy&order&limit&skip` | Paged tally list |
//! | `GET`  | `/characters/top/liked` | Most liked, or `null` |
//! | `GET`  | `/characters/top/disliked` | Most disliked, or `null` |
//! | `GET`  | `/characters/last-evaluated` | Most recently voted, or `null` |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "invalid_source", "message": "invalid source: digimon" } }
//! ```
//!
//! | Code | Status |
//! |------|--------|
//! | `invalid_source`, `misconfigured`, `bad_request` | 400 |
//! | `storage_failure` | 500 |
//! | `upstream_unavailable` | 502 |
//! | `no_sources_available` | 503 |

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use character_tally_core::models::{
    Character, CharacterListItem, CharacterPage, ListQuery, VoteAck, VoteRequest,
};
use character_tally_core::{Source, TallyError};

use crate::config::Config;
use crate::service::CharacterService;
use crate::sources::{source_statuses, SourceStatus};
use crate::sqlite_store::SqliteStore;
use crate::traits::ExternalId;
use crate::{db, migrate};

#[derive(Clone)]
struct AppState {
    service: Arc<CharacterService>,
}

/// Open the configured database, migrate it and serve on `[server].bind`
/// until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let store = Arc::new(SqliteStore::new(pool));
    let service = Arc::new(CharacterService::from_config(config, store)?);

    serve(&config.server.bind, service).await
}

/// Serve an already-wired service. Tests use this with stub adapters.
pub async fn serve(bind: &str, service: Arc<CharacterService>) -> anyhow::Result<()> {
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(service: Arc<CharacterService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/sources", get(handle_sources))
        .route("/characters", get(handle_list))
        .route("/characters/random", get(handle_random))
        .route("/characters/vote", post(handle_vote))
        .route("/characters/top/liked", get(handle_top_liked))
        .route("/characters/top/disliked", get(handle_top_disliked))
        .route("/characters/last-evaluated", get(handle_last_evaluated))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { service })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TallyError> for AppError {
    fn from(err: TallyError) -> Self {
        let status = match &err {
            TallyError::InvalidSource(_)
            | TallyError::Misconfigured { .. }
            | TallyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TallyError::NoSourcesAvailable => StatusCode::SERVICE_UNAVAILABLE,
            TallyError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            TallyError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = ?err, "request failed");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError::from(TallyError::InvalidInput(message.into()))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /sources ============

async fn handle_sources(State(state): State<AppState>) -> Json<Vec<SourceStatus>> {
    Json(source_statuses(state.service.adapters()))
}

// ============ GET /characters/random ============

#[derive(Debug, Default, Deserialize)]
struct RandomParams {
    source: Option<String>,
}

/// Blank query values count as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn handle_random(
    State(state): State<AppState>,
    Query(params): Query<RandomParams>,
) -> Result<Json<Character>, AppError> {
    let source = non_blank(params.source)
        .map(|s| s.parse::<Source>())
        .transpose()?;
    let character = state.service.get_random_character(source).await?;
    Ok(Json(character))
}

// ============ POST /characters/vote ============

/// Vote body as received; converted to [`VoteRequest`] so unknown sources
/// and vote kinds surface as typed errors instead of extractor rejections.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteBody {
    source: String,
    #[serde(default)]
    source_id: Option<ExternalId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    image: Option<String>,
    vote: String,
}

impl TryFrom<VoteBody> for VoteRequest {
    type Error = TallyError;

    fn try_from(body: VoteBody) -> Result<Self, Self::Error> {
        Ok(VoteRequest {
            source: body.source.parse()?,
            source_id: body.source_id.map(|id| id.to_string()).unwrap_or_default(),
            name: body.name.unwrap_or_default(),
            image: body.image.unwrap_or_default(),
            vote: body.vote.parse()?,
        })
    }
}

async fn handle_vote(
    State(state): State<AppState>,
    body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<(StatusCode, Json<VoteAck>), AppError> {
    let Json(body) = body.map_err(|rejection| bad_request(rejection.body_text()))?;
    let vote = VoteRequest::try_from(body)?;
    let ack = state.service.record_vote(&vote).await?;
    Ok((StatusCode::CREATED, Json(ack)))
}

// ============ GET /characters ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    source: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
    limit: Option<String>,
    skip: Option<String>,
}

fn parse_int(name: &str, raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| bad_request(format!("{} must be an integer, got '{}'", name, raw)))
}

impl ListParams {
    fn into_query(self) -> Result<ListQuery, AppError> {
        let mut query = ListQuery::default();
        if let Some(source) = non_blank(self.source) {
            query.source = Some(source.parse()?);
        }
        if let Some(sort_by) = non_blank(self.sort_by) {
            query.sort_by = sort_by.parse()?;
        }
        if let Some(order) = non_blank(self.order) {
            query.order = order.parse()?;
        }
        if let Some(limit) = non_blank(self.limit) {
            query.limit = parse_int("limit", &limit)?;
        }
        if let Some(skip) = non_blank(self.skip) {
            query.skip = parse_int("skip", &skip)?;
        }
        Ok(query)
    }
}

async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<CharacterPage>, AppError> {
    let query = params.into_query()?;
    let page = state.service.list_characters(&query).await?;
    Ok(Json(page))
}

// ============ Top queries ============

async fn handle_top_liked(
    State(state): State<AppState>,
) -> Result<Json<Option<CharacterListItem>>, AppError> {
    Ok(Json(state.service.top_liked().await?))
}

async fn handle_top_disliked(
    State(state): State<AppState>,
) -> Result<Json<Option<CharacterListItem>>, AppError> {
    Ok(Json(state.service.top_disliked().await?))
}

async fn handle_last_evaluated(
    State(state): State<AppState>,
) -> Result<Json<Option<CharacterListItem>>, AppError> {
    Ok(Json(state.service.last_evaluated().await?))
}
