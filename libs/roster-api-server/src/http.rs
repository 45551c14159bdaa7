use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use roster_api::{SaveError, StudentPayload, StudentRecord, StudentStore, ValidationError};

use super::AppState;

// ═══════════════════════════════════════════════════════════════
//  REST: POST /api/save
// ═══════════════════════════════════════════════════════════════

/// Both error kinds collapse to the same 500 so callers cannot tell bad
/// input from a dead database; the logs can.
pub(crate) async fn handle_save(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let outcome = match body {
        Ok(bytes) => save_student(state.store.as_ref(), &bytes).await,
        Err(rejection) => Err(ValidationError::Body(rejection.body_text()).into()),
    };

    match outcome {
        Ok(record) => {
            tracing::info!(name = %record.name, "student saved");
            (StatusCode::OK, "saved")
        }
        Err(SaveError::Validation(e)) => {
            tracing::warn!(error = %e, "save rejected");
            (StatusCode::INTERNAL_SERVER_ERROR, "error")
        }
        Err(SaveError::Persistence(e)) => {
            tracing::error!(kind = %e.kind(), error = %e, "upsert failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "error")
        }
    }
}

/// Parse, validate and upsert one fully buffered body.
///
/// The store is only touched once the payload is a valid record.
pub async fn save_student(store: &dyn StudentStore, body: &[u8]) -> Result<StudentRecord, SaveError> {
    tracing::debug!(raw = %String::from_utf8_lossy(body), "save body");

    let payload = StudentPayload::from_slice(body)?;
    tracing::debug!(parsed = ?payload.fields(), "save payload");

    let record = payload.validate()?;
    store.upsert(&record).await?;
    Ok(record)
}
