use axum::body::Body;
use axum::extract::{Extension, Path};
use axum::http::{header, StatusCode};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::error;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/users/:id/download/:slot_token - streams one stored file with
/// its original name. The token is a bare slot name (`profileImage`, `doc1`,
/// `doc2`) or an indexed one (`doc3-<i>`, `doc4-<i>`).
pub async fn download(
    Extension(state): Extension<AppState>,
    Path((id, slot_token)): Path<(i64, String)>,
) -> Result<Response, ApiError> {
    let target = state.users.resolve_download(id, &slot_token).await?;

    let file = tokio::fs::File::open(&target.path).await.map_err(|e| {
        error!(user_id = id, error = %e, "failed to open resolved blob");
        ApiError::internal_server_error("File storage error occurred")
    })?;

    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&target.file_name),
        )
        .body(body)
        .map_err(|e| {
            error!(error = %e, "failed to build download response");
            ApiError::internal_server_error("File storage error occurred")
        })
}

/// `attachment; filename="..."` with the name reduced to characters that are
/// safe inside a quoted string.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let name = if ascii_safe.is_empty() { "download".to_string() } else { ascii_safe };
    format!("attachment; filename=\"{}\"", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_sanitizes_hostile_names() {
        assert_eq!(
            content_disposition_value("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition_value("a\"; rm -rf ;\\.pdf"),
            "attachment; filename=\"arm-rf.pdf\""
        );
        assert_eq!(
            content_disposition_value("日本語"),
            "attachment; filename=\"download\""
        );
    }
}
