use axum::{
    extract::{Multipart, Path, State},
    routing::{delete, post},
    Json, Router,
};
use tracing::info;

use crate::extraction::DocumentFormat;
use crate::models::{AppState, DeleteResponse, UploadResponse};
use crate::types::{AppError, AppResult};

const FILE_FIELD: &str = "file";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/files", post(upload_file))
        .route("/api/files/{file_id}", delete(delete_file))
        .with_state(state)
}

async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidRequest("File field has no file name".to_string()))?;
        let format = DocumentFormat::from_file_name(&file_name)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read upload: {}", e)))?;

        info!(file_name = %file_name, format = %format, size = data.len(), "Uploading document");

        let file_id = state
            .storage
            .upload(
                &file_name,
                data.to_vec(),
                format.mime_type(),
                &state.config.storage.folder_id,
            )
            .await?;

        info!(file_id = %file_id, "Document uploaded");

        return Ok(Json(UploadResponse {
            message: format!("Your file \"{}\" is uploaded successfully!", file_name),
            file_id,
            file_name,
        }));
    }

    Err(AppError::InvalidRequest(format!("Missing \"{}\" field", FILE_FIELD)))
}

async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    state.storage.delete(&file_id).await?;
    let had_index = state.indexes.remove(&file_id).await.is_some();

    info!(file_id = %file_id, had_index, "Document deleted");

    Ok(Json(DeleteResponse {
        status: "deleted".to_string(),
        file_id,
    }))
}
