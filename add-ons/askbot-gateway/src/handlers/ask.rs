//! POST /ask: runs one question through the answer resolver.

use crate::error::ApiError;
use crate::AppState;
use askbot_core::AnswerResult;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use tracing::Instrument;

#[derive(serde::Deserialize)]
pub(crate) struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

pub(crate) async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AnswerResult>, ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let question = req.question.unwrap_or_default();

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("ask", %request_id);
    async move {
        tracing::info!(target: "askbot::gateway", chars = question.chars().count(), "Question received");
        let result = state.resolver.resolve(&question).await?;
        Ok::<_, ApiError>(Json(result))
    }
    .instrument(span)
    .await
}
