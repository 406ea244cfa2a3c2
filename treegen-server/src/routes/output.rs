//! Static image serving for rendered trees

use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

/// GET /output/{filename} - files under `pics_dir`, 404 when missing
pub fn router<S>(pics_dir: impl AsRef<Path>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().nest_service("/output", ServeDir::new(pics_dir.as_ref()))
}
