use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::catalog::{GroupId, LevelId, WordId};
use crate::extractors::PathParams;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(summary))
        .route("/levels", get(list_levels))
        .route("/groups/:group_id", get(get_group))
}

async fn summary(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    ok(state.catalog().summary())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupSummary {
    id: GroupId,
    name: String,
    word_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LevelView {
    id: LevelId,
    name: String,
    groups: Vec<GroupSummary>,
}

async fn list_levels(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let catalog = state.catalog();
    let levels: Vec<LevelView> = catalog
        .levels()
        .iter()
        .map(|level| LevelView {
            id: level.id,
            name: level.name.clone(),
            groups: level
                .groups
                .iter()
                .filter_map(|group_id| catalog.group(*group_id))
                .map(|group| GroupSummary {
                    id: group.id,
                    name: group.name.clone(),
                    word_count: group.words.len(),
                })
                .collect(),
        })
        .collect();
    ok(levels)
}

#[derive(Debug, Deserialize)]
struct GroupQuery {
    lang: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupWordView {
    id: WordId,
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupView {
    id: GroupId,
    name: String,
    level_id: Option<LevelId>,
    words: Vec<GroupWordView>,
}

/// One group with its words; `?lang=` resolves word texts in that language,
/// otherwise the group's own labels are returned.
async fn get_group(
    State(state): State<AppState>,
    PathParams(group_id): PathParams<GroupId>,
    Query(query): Query<GroupQuery>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let catalog = state.catalog();
    let group = catalog
        .group(group_id)
        .ok_or_else(|| AppError::not_found(&format!("group {group_id} not found")))?;

    if let Some(lang) = query.lang.as_deref() {
        if !catalog.has_language(lang) {
            return Err(AppError::validation(&format!(
                "language {lang} is not in the catalog"
            )));
        }
    }

    let words = group
        .words
        .iter()
        .map(|word| GroupWordView {
            id: word.id,
            text: match query.lang.as_deref() {
                Some(lang) => catalog.word_text(lang, word.id).map(str::to_string),
                None => word.text.clone(),
            },
        })
        .collect();

    Ok(ok(GroupView {
        id: group.id,
        name: group.name.clone(),
        level_id: catalog.level_of_group(group.id),
        words,
    }))
}
