use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::error::{Error, Result};

/// Allows browser calls from the one configured front-end origin.
pub fn frontend_cors(origin: &str) -> Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|_| Error::Config(format!("Invalid FRONTEND_ORIGIN: {}", origin)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any))
}
