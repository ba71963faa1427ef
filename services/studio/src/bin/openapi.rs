//! services/studio/src/bin/openapi.rs
//!
//! Dumps the studio's OpenAPI document as pretty JSON. The output path is the
//! first argument, `openapi.json` when omitted.

use studio_lib::error::ApiError;
use studio_lib::web::ApiDoc;
use tracing::info;
use utoipa::OpenApi;

fn main() -> Result<(), ApiError> {
    tracing_subscriber::fmt().with_target(false).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    let document = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(|e| ApiError::Internal(format!("Failed to serialize the API document: {}", e)))?;
    std::fs::write(&path, document)?;

    info!(path = %path, routes = ApiDoc::openapi().paths.paths.len(), "API document written");
    Ok(())
}
