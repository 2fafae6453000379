use axum::Json;
use axum::extract::{Multipart, State};
use serde_json::{Value, json};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::telemetry::metrics::{QA_REPORT_SIZE, QA_SESSIONS_CREATED};

/// Accepts a multipart upload with a `file` part, stores the decoded text
/// and returns the new session id. Empty files are accepted; only a
/// missing or unreadable part is rejected.
pub async fn upload_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let mut report_text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(format!("unreadable multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Upload(format!("failed to read file part: {e}")))?;
        report_text = Some(decode_report(&bytes));
        break;
    }

    let report_text =
        report_text.ok_or_else(|| AppError::Upload("missing 'file' field".to_string()))?;

    QA_REPORT_SIZE.record(report_text.chars().count() as f64, &[]);
    QA_SESSIONS_CREATED.add(1, &[]);

    let session_id = state.sessions.create(report_text).await;

    tracing::info!(session_id = %session_id, "Report uploaded");

    Ok(Json(json!({
        "message": "Report uploaded successfully",
        "session_id": session_id,
    })))
}

/// Decodes report bytes as UTF-8, falling back to Latin-1 so no upload is
/// rejected for encoding alone.
fn decode_report(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_report("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // 0xE9 is 'é' in Latin-1 but invalid as a standalone UTF-8 byte.
        let bytes = [b'c', b'a', b'f', 0xE9];
        assert_eq!(decode_report(&bytes), "café");
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_report(&[]), "");
    }
}
