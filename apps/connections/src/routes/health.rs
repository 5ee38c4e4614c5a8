use axum::Json;
use serde_json::{json, Value};

/// GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// GET /
/// Service name, version and the endpoints it serves.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "NYTimes Connections API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "get_game": "/v1/connections/{date}",
            "health": "/health"
        }
    }))
}
