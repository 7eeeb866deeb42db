use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::models::{AskDebug, AskRequest, AskResponse};
use crate::services::prompt::{build_prompt, NO_QUESTION_ANSWER};
use crate::services::BackendError;
use crate::startup::AppState;

/// HTTP status for a failed generation.
pub fn status_for(error: &BackendError) -> StatusCode {
    match error {
        BackendError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
        BackendError::ModelFault(_)
        | BackendError::DecodeFault(_)
        | BackendError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(
    state: &AppState,
    status: StatusCode,
    answer: String,
    kind: &str,
    detail: String,
) -> Response {
    let debug = state.config.is_development().then(|| AskDebug {
        kind: kind.to_string(),
        detail,
    });

    (status, Json(AskResponse { answer, debug })).into_response()
}

fn invalid_request(state: &AppState, message: String, detail: String) -> Response {
    tracing::warn!(error = %message, "Rejected /ask body");
    failure(
        state,
        StatusCode::BAD_REQUEST,
        format!("Invalid request: {}", message),
        "invalid_request",
        detail,
    )
}

/// Answer a question with the configured backend.
///
/// Every outcome is a JSON body with an `answer` key. An empty question is
/// answered with 200 without calling the backend.
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return invalid_request(&state, rejection.body_text(), format!("{:?}", rejection));
        }
    };
    let request = match AskRequest::from_json(body) {
        Ok(request) => request,
        Err(e) => return invalid_request(&state, e.to_string(), format!("{:?}", e)),
    };

    let question = request.question();
    if question.is_empty() {
        return (StatusCode::OK, Json(AskResponse::answer(NO_QUESTION_ANSWER))).into_response();
    }

    let prompt = build_prompt(question);
    let params = state.config.generation;

    match state.backend.generate(&prompt, &params).await {
        Ok(text) => {
            tracing::info!(
                question_len = question.len(),
                answer_len = text.len(),
                "Answered question"
            );
            (StatusCode::OK, Json(AskResponse::answer(text.trim()))).into_response()
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Answer generation failed");
            failure(
                &state,
                status_for(&e),
                format!("Error generating answer: {}", e),
                e.kind(),
                format!("{:?}", e),
            )
        }
    }
}
