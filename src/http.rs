//! HTTP sidecar: health check, room management API, Prometheus metrics.
//!
//! Runs on its own tokio task. The real-time path is the WebSocket
//! gateway; this surface only creates, lists, inspects, and deletes rooms,
//! and serves `/metrics` for Prometheus scraping.

use crate::state::{Hub, RoomSummary};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

/// Handler for GET / and GET /health - service liveness report.
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "flowstate",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Handler for GET /openapi.json - static API description.
async fn openapi_handler() -> Json<serde_json::Value> {
    Json(json!({
        "openapi": "3.1.0",
        "info": {
            "title": "FlowState API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Real-time collaboration API with WebSocket support for live document editing, cursor tracking, and presence detection.",
        },
        "tags": [
            {"name": "Health", "description": "API health check"},
            {"name": "Rooms", "description": "Collaboration room management"},
            {"name": "WebSocket", "description": "Real-time communication"},
        ],
        "paths": {
            "/": {
                "get": {
                    "tags": ["Health"],
                    "summary": "Health check",
                    "description": "Returns API health status",
                    "responses": {"200": {"description": "API is healthy"}},
                },
            },
            "/api/rooms": {
                "get": {
                    "tags": ["Rooms"],
                    "summary": "List all rooms",
                    "description": "Get all active collaboration rooms",
                    "responses": {"200": {"description": "List of rooms"}},
                },
                "post": {
                    "tags": ["Rooms"],
                    "summary": "Create a room",
                    "description": "Create a new collaboration room",
                    "responses": {"201": {"description": "Room created"}},
                },
            },
            "/api/rooms/{roomId}": {
                "get": {
                    "tags": ["Rooms"],
                    "summary": "Get room details",
                    "description": "Get room info including connected clients and document state",
                    "responses": {
                        "200": {"description": "Room details"},
                        "404": {"description": "Room not found"},
                    },
                },
                "delete": {
                    "tags": ["Rooms"],
                    "summary": "Delete a room",
                    "description": "Delete a collaboration room",
                    "responses": {"200": {"description": "Room deleted"}},
                },
            },
            "/ws": {
                "get": {
                    "tags": ["WebSocket"],
                    "summary": "WebSocket connection",
                    "description": "Upgrade to WebSocket for real-time collaboration. Message types: join, leave, cursor, focus, edit, presence, typing, sync",
                },
            },
        },
    }))
}

/// Handler for GET /docs - Swagger UI shell pointed at /openapi.json.
async fn docs_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>FlowState API Documentation</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        SwaggerUIBundle({
            url: "/openapi.json",
            dom_id: '#swagger-ui',
            presets: [SwaggerUIBundle.presets.apis, SwaggerUIBundle.SwaggerUIStandalonePreset],
            layout: "BaseLayout"
        });
    </script>
</body>
</html>"#,
    )
}

/// Handler for GET /api/rooms - list all rooms with member counts.
async fn list_rooms_handler(State(hub): State<Arc<Hub>>) -> Json<Vec<RoomSummary>> {
    Json(hub.list_rooms().await)
}

#[derive(Debug, Deserialize)]
struct CreateRoomRequest {
    #[serde(default)]
    name: String,
}

/// Handler for POST /api/rooms - create a room.
async fn create_room_handler(
    State(hub): State<Arc<Hub>>,
    Json(req): Json<CreateRoomRequest>,
) -> impl IntoResponse {
    let room = hub.create_room(&req.name);
    tracing::info!(room_id = %room.id, name = %room.name, "Room created");
    (
        StatusCode::CREATED,
        Json(json!({"id": room.id, "name": room.name})),
    )
}

/// Handler for GET /api/rooms/{id} - room details with roster and document.
async fn get_room_handler(State(hub): State<Arc<Hub>>, Path(room_id): Path<String>) -> Response {
    match hub.get_room(&room_id) {
        Some(room) => {
            let room = room.read().await;
            let (document, clients) = room.snapshot();
            Json(json!({
                "id": room.id,
                "name": room.name,
                "clients": clients,
                "document": document,
            }))
            .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Room not found"})),
        )
            .into_response(),
    }
}

/// Handler for DELETE /api/rooms/{id} - remove a room.
///
/// Clients still attached keep their handles until they leave; the Hub
/// simply stops listing the room.
async fn delete_room_handler(State(hub): State<Arc<Hub>>, Path(room_id): Path<String>) -> Response {
    if hub.delete_room(&room_id) {
        tracing::info!(room_id = %room_id, "Room deleted");
        Json(json!({"message": "Room deleted"})).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Room not found"})),
        )
            .into_response()
    }
}

/// Build the management router.
pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_handler))
        .route("/docs", get(docs_handler))
        .route("/api/rooms", get(list_rooms_handler).post(create_room_handler))
        .route(
            "/api/rooms/:room_id",
            get(get_room_handler).delete(delete_room_handler),
        )
        .with_state(hub)
}

/// Run the HTTP sidecar.
///
/// Binds to `0.0.0.0:port`. This is a long-running task that should be
/// spawned in the background.
pub async fn run_http_server(port: u16, hub: Arc<Hub>) {
    let app = router(hub);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("HTTP server error: {}", e);
    }
}
