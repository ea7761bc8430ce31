use crate::commit::CommitOutcome;
use crate::draft::{EventDraft, ImportRequest};
use crate::error::ImportError;
use crate::pipeline::ImportPipeline;
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Json as AxumJson, Router,
};
use hyper::Server;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "event-importer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Serialize)]
struct CommitResponse {
    id: Uuid,
    venue_id: Option<Uuid>,
    host_id: Option<Uuid>,
    warnings: Vec<String>,
}

impl From<CommitOutcome> for CommitResponse {
    fn from(outcome: CommitOutcome) -> Self {
        Self {
            id: outcome.event.id,
            venue_id: outcome.event.venue_id,
            host_id: outcome.event.host_id,
            warnings: outcome.warnings,
        }
    }
}

/// Map pipeline errors onto the wire: a duplicate is a 409 carrying the
/// existing record's id, operator-correctable input problems are 400,
/// everything else is 500 with a generic `{error}` payload.
fn error_response(e: ImportError) -> Response {
    match e {
        ImportError::Duplicate { existing_id } => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": "Event already imported",
                "existing_id": existing_id
            })),
        )
            .into_response(),
        ImportError::InvalidUrl { .. } | ImportError::Fetch { .. } | ImportError::MissingField(_) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": other.to_string() })),
        )
            .into_response(),
    }
}

/// Create the HTTP server with all routes
pub fn create_server(pipeline: Arc<ImportPipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(
            "/admin/import",
            post({
                let pl = pipeline.clone();
                move |AxumJson(request): AxumJson<ImportRequest>| {
                    let pl = pl.clone();
                    async move {
                        match pl.preview(request).await {
                            Ok(draft) => AxumJson::<EventDraft>(draft).into_response(),
                            Err(e) => error_response(e),
                        }
                    }
                }
            }),
        )
        .route(
            "/admin/commit",
            post({
                let pl = pipeline.clone();
                move |AxumJson(draft): AxumJson<EventDraft>| {
                    let pl = pl.clone();
                    async move {
                        match pl.commit(&draft).await {
                            Ok(outcome) => {
                                AxumJson(CommitResponse::from(outcome)).into_response()
                            }
                            Err(e) => error_response(e),
                        }
                    }
                }
            }),
        )
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    pipeline: Arc<ImportPipeline>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(pipeline);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 Admin API running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📥 Import:       POST http://localhost:{port}/admin/import");
    println!("💾 Commit:       POST http://localhost:{port}/admin/commit");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
