use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::engine::types::{AnswerSubmission, NextItemRequest};
use crate::extractors::{JsonBody, PathParams};
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:learner_id/languages", get(list_languages))
        .route("/:learner_id/languages/:lang/next-item", post(next_item))
        .route("/:learner_id/languages/:lang/answers", post(submit_answer))
        .route(
            "/:learner_id/languages/:lang/progress",
            get(get_progress).delete(reset_progress),
        )
        .route("/:learner_id/languages/:lang/scopes", get(get_scopes))
}

async fn list_languages(
    State(state): State<AppState>,
    PathParams(learner_id): PathParams<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let languages = state.engine().list_languages(&learner_id).await?;
    Ok(ok(languages))
}

async fn next_item(
    State(state): State<AppState>,
    PathParams((learner_id, lang)): PathParams<(String, String)>,
    JsonBody(req): JsonBody<NextItemRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let item = state.engine().get_next_item(&learner_id, &lang, &req).await?;
    Ok(ok(item))
}

async fn submit_answer(
    State(state): State<AppState>,
    PathParams((learner_id, lang)): PathParams<(String, String)>,
    JsonBody(req): JsonBody<AnswerSubmission>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let outcome = state.engine().submit_answer(&learner_id, &lang, &req).await?;
    Ok(ok(outcome))
}

async fn get_progress(
    State(state): State<AppState>,
    PathParams((learner_id, lang)): PathParams<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let progress = state.engine().get_progress(&learner_id, &lang).await?;
    Ok(ok(progress))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetResult {
    removed: bool,
}

async fn reset_progress(
    State(state): State<AppState>,
    PathParams((learner_id, lang)): PathParams<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let removed = state.engine().reset_progress(&learner_id, &lang).await?;
    Ok(ok(ResetResult { removed }))
}

async fn get_scopes(
    State(state): State<AppState>,
    PathParams((learner_id, lang)): PathParams<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let scopes = state.engine().get_available_scopes(&learner_id, &lang).await?;
    Ok(ok(scopes))
}
