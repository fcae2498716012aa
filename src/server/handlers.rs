use std::convert::Infallible;

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::Stream;
use tokio::sync::mpsc;

use crate::export::{export_filename, to_csv};
use crate::models::{AnalysisEvent, AnalysisRequest, AnalysisResult};
use crate::server::error::ApiError;
use crate::server::AppState;

/// Pulls the `file` part out of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        // A plain form value under "file" is not an upload.
        let Some(filename) = field.file_name().map(str::to_string) else {
            return Err(ApiError::NoFileUploaded);
        };
        if filename.is_empty() {
            return Err(ApiError::NoFileSelected);
        }

        let bytes = field.bytes().await?;
        tracing::info!("Received upload {} ({} bytes)", filename, bytes.len());
        return Ok((filename, bytes.to_vec()));
    }

    Err(ApiError::NoFileUploaded)
}

/// `POST /upload`: synchronous analysis.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let (filename, bytes) = read_upload(multipart).await?;
    let result = state
        .pipeline
        .analyze(AnalysisRequest::new(bytes, &filename))
        .await?;
    Ok(Json(result))
}

/// `POST /stream-analysis`: server-sent events, one per pipeline step.
///
/// Always answers 200; a bad upload becomes a single `error` event.
pub async fn stream_analysis(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = match read_upload(multipart).await {
        Ok((filename, bytes)) => state
            .pipeline
            .clone()
            .stream(AnalysisRequest::new(bytes, &filename), state.stream_capacity),
        Err(e) => {
            tracing::warn!("Rejected streaming upload: {}", e);
            let (tx, rx) = mpsc::channel(1);
            let _ = tx.try_send(AnalysisEvent::error(e.to_string()));
            rx
        }
    };

    Sse::new(event_stream(rx)).keep_alive(KeepAlive::default())
}

fn event_stream(
    rx: mpsc::Receiver<AnalysisEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        let sse = match Event::default().json_data(&event) {
            Ok(sse) => sse,
            Err(e) => {
                tracing::error!("Failed to encode event: {}", e);
                Event::default().data(r#"{"type":"error","message":"event encoding failed"}"#)
            }
        };
        Some((Ok(sse), rx))
    })
}

/// `POST /export`: CSV download of a previously returned result.
pub async fn export(Json(result): Json<AnalysisResult>) -> impl IntoResponse {
    let now = chrono::Local::now().naive_local();
    let filename = export_filename(now);
    tracing::info!("Exporting {} as {}", result.filename, filename);

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        to_csv(&result, now),
    )
}
