//! HTTP query service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | All records as a JSON array; also rewrites the results file |
//! | `POST` | `/q` | Batch equality lookup, one result per query object |
//! | `GET`  | `/results` | The results file last written by `GET /` |
//! | `GET`  | `/imgs/{name}` | Downloaded cover images |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # `POST /q`
//!
//! The body is a JSON array of query objects, each holding any subset of
//! `title`, `description`, `filename`, and `source_url` (`src` is accepted
//! as an alias). The response array is aligned with the input: element *i*
//! is the lowest-id record matching every field of query *i*, or a
//! zero-valued record when nothing matches.
//!
//! ```json
//! [{"title": "Dunes"}, {"filename": "missing.png"}]
//! ```
//!
//! A body that is not a JSON array of objects is answered with
//! `400 {"message": "Error occurred when parsing your JSON query ! X( "}`.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::config::Config;
use crate::export;
use crate::models::{Record, RecordQuery};
use crate::store::RecordStore;

/// Message returned for an unparseable `POST /q` body.
pub const QUERY_PARSE_ERROR: &str = "Error occurred when parsing your JSON query ! X( ";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    /// Rewritten with the full dump on every `GET /`.
    pub results_path: PathBuf,
}

/// Builds the router. `assets_dir` is served under `/imgs`.
pub fn router(state: AppState, assets_dir: PathBuf) -> Router {
    let results = ServeFile::new(&state.results_path);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_all))
        .route("/q", post(handle_query))
        .route("/health", get(handle_health))
        .route_service("/results", results)
        .nest_service("/imgs", ServeDir::new(assets_dir))
        .layer(cors)
        .with_state(state)
}

/// Binds `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: &Config, store: Arc<dyn RecordStore>) -> anyhow::Result<()> {
    let state = AppState {
        store,
        results_path: config.server.results_path.clone(),
    };
    let app = router(state, config.assets.dir.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    println!("Server listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct MessageBody {
    message: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(MessageBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    tracing::error!("{:#}", err);
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: err.to_string(),
    }
}

// ============ GET / ============

/// Returns every record. The results file is rewritten with the same bytes;
/// a failed write is logged and does not affect the response.
async fn handle_all(State(state): State<AppState>) -> Result<Response, AppError> {
    let records = state.store.all().await.map_err(internal)?;
    let payload = export::records_json(&records).map_err(internal)?;

    if let Err(e) = export::write_results(&state.results_path, &payload).await {
        tracing::warn!("{:#}", e);
    }

    Ok((
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        payload,
    )
        .into_response())
}

// ============ POST /q ============

async fn handle_query(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<Record>>, AppError> {
    let queries: Vec<RecordQuery> =
        serde_json::from_slice(&body).map_err(|_| bad_request(QUERY_PARSE_ERROR))?;

    let mut results = Vec::with_capacity(queries.len());
    for query in &queries {
        let hit = state.store.find_first(query).await.map_err(internal)?;
        results.push(hit.unwrap_or_default());
    }

    Ok(Json(results))
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
