use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::qa::orchestrator::ModelParams;
use crate::qa::{QaRequest, QaResult, answer_question};

pub async fn ask_question(
    State(state): State<AppState>,
    Json(body): Json<QaRequest>,
) -> AppResult<Json<QaResult>> {
    let params = ModelParams {
        model: state.config.llm_model.clone(),
        temperature: state.config.default_temperature,
        max_tokens: state.config.default_max_tokens,
    };

    let result = answer_question(&state.sessions, &state.llm_client, &params, &body).await?;

    Ok(Json(result))
}
