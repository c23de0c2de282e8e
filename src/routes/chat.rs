use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::{future, stream::BoxStream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::data_registry::IndexRecord;
use crate::extraction::{DocumentFormat, ExtractedDocument};
use crate::models::{AppState, ChatRequest};
use crate::qa::{message_stream, QUERY_FAILED_MESSAGE};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(post_chat))
        .with_state(state)
}

pub async fn post_chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    info!(file_id = %request.file_id, message_len = request.message.len(), "Received chat request");

    match answer(&state, &request).await {
        Ok(stream) => streaming_response(StatusCode::OK, stream),
        Err(err) => {
            error!(file_id = %request.file_id, error = ?err, "Query did not run");
            streaming_response(err.status_code(), message_stream(QUERY_FAILED_MESSAGE))
        }
    }
}

async fn answer(state: &AppState, request: &ChatRequest) -> AppResult<BoxStream<'static, AppResult<String>>> {
    if request.message.trim().is_empty() {
        return Err(AppError::InvalidRequest("Message is empty".to_string()));
    }

    let record = document_index(state, &request.file_id).await?;
    state.qa.query(&record.index, &request.message).await
}

/// Cached index for `file_id`, building it on first use
async fn document_index(state: &AppState, file_id: &str) -> AppResult<IndexRecord> {
    if let Some(record) = state.indexes.get(file_id).await {
        debug!(file_id = %file_id, "Using cached document index");
        return Ok(record);
    }

    let stored = state.storage.fetch(file_id).await?;
    let format = DocumentFormat::from_mime_type(&stored.mime_type)?;

    let data = stored.data;
    let text = tokio::task::spawn_blocking(move || {
        ExtractedDocument::extract(&data, format).map(ExtractedDocument::into_text)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))??;

    info!(file_id = %file_id, format = %format, text_len = text.len(), "Extracted document text");

    let index = state.qa.build_index(&text).await?;
    let record = IndexRecord {
        file_id: file_id.to_string(),
        format,
        index: Arc::new(index),
    };
    state.indexes.insert(record.clone()).await;
    Ok(record)
}

fn streaming_response(status: StatusCode, stream: BoxStream<'static, AppResult<String>>) -> Response {
    let body = stream.scan(false, |failed, chunk| {
        if *failed {
            return future::ready(None);
        }
        let text = match chunk {
            Ok(text) => text,
            Err(err) => {
                error!(error = ?err, "Answer stream failed");
                *failed = true;
                QUERY_FAILED_MESSAGE.to_string()
            }
        };
        future::ready(Some(Ok::<_, Infallible>(text)))
    });

    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}
