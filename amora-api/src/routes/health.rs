use axum::Json;

use amora_shared::types::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("amora-api", env!("CARGO_PKG_VERSION")))
}
