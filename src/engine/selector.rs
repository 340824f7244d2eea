//! Picks the next item to present. Selection reads the profile and never
//! writes to it.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{ContentCatalog, GroupId, WordId};
use crate::engine::config::EngineConfig;
use crate::engine::gating;
use crate::engine::profile::LearnerProfile;
use crate::engine::question::{build_question, QuestionSpec};
use crate::engine::rank::{effective_weights, rank_of, sample_rank};
use crate::engine::types::{
    ActivityType, Direction, DirectionPreference, DoneReason, NextItem, NextItemRequest, Rank,
    Scope,
};
use crate::engine::EngineError;

/// Words of a scope, before the translation filter.
enum ScopeWords {
    Words(Vec<WordId>),
    Done(DoneReason),
}

pub fn validate_request(
    catalog: &ContentCatalog,
    target_lang: &str,
    native_lang: &str,
    request: &NextItemRequest,
) -> Result<(), EngineError> {
    if request.allowed_activities.is_empty() {
        return Err(EngineError::Validation(
            "allowedActivities must not be empty".to_string(),
        ));
    }
    if !catalog.has_language(native_lang) {
        return Err(EngineError::Validation(format!(
            "native language {native_lang} is not in the catalog"
        )));
    }
    if native_lang == target_lang {
        return Err(EngineError::Validation(
            "native language must differ from the target language".to_string(),
        ));
    }
    match request.scope {
        Scope::Group { id } if catalog.group(id).is_none() => {
            Err(EngineError::Validation(format!("unknown group {id}")))
        }
        Scope::Level { id } if catalog.level(id).is_none() => {
            Err(EngineError::Validation(format!("unknown level {id}")))
        }
        _ => Ok(()),
    }
}

pub fn next_item<R: Rng + ?Sized>(
    catalog: &ContentCatalog,
    profile: &LearnerProfile,
    native_lang: &str,
    request: &NextItemRequest,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<NextItem, EngineError> {
    let target_lang = profile.lang.as_str();
    validate_request(catalog, target_lang, native_lang, request)?;

    let words = match scope_words(catalog, profile, request.scope) {
        ScopeWords::Words(words) => words,
        ScopeWords::Done(reason) => return Ok(NextItem::Done { reason }),
    };
    let candidates = presentable(catalog, target_lang, native_lang, words);
    if candidates.is_empty() {
        let reason = match request.scope {
            Scope::MasteredReview => DoneReason::ReviewQueueEmpty,
            _ => DoneReason::NoCandidates,
        };
        return Ok(NextItem::Done { reason });
    }

    let buckets = bucket_by_rank(profile, &candidates, config);
    let present: [bool; 5] = std::array::from_fn(|i| !buckets[i].is_empty());
    let weights = effective_weights(&present, &config.ranks);
    let rank = sample_rank(&weights, rng)
        .ok_or_else(|| EngineError::CannotBuildQuestion("rank sampling failed".to_string()))?;
    let word_id = *buckets[rank.index()]
        .choose(rng)
        .ok_or_else(|| EngineError::CannotBuildQuestion(format!("{rank:?} bucket is empty")))?;

    let activity = pick_activity(&request.allowed_activities, rng)?;
    let direction = match request.direction {
        DirectionPreference::NativeToTarget => Direction::NativeToTarget,
        DirectionPreference::TargetToNative => Direction::TargetToNative,
        DirectionPreference::Any if rng.gen_bool(0.5) => Direction::NativeToTarget,
        DirectionPreference::Any => Direction::TargetToNative,
    };

    let question = build_question(
        catalog,
        &QuestionSpec {
            word_id,
            target_lang,
            native_lang,
            activity,
            direction,
            rank,
            include_details: request.include_details,
            mc_choice_count: config.selection.mc_choice_count,
        },
        rng,
    )?;
    Ok(NextItem::Question(question))
}

fn scope_words(catalog: &ContentCatalog, profile: &LearnerProfile, scope: Scope) -> ScopeWords {
    match scope {
        Scope::Recommended => {
            ScopeWords::Words(words_of_groups(catalog, &gating::open_groups(catalog, profile)))
        }
        Scope::Group { id } => {
            if !gating::is_group_open(catalog, profile, id) {
                return ScopeWords::Done(DoneReason::ScopeLocked);
            }
            ScopeWords::Words(words_of_groups(catalog, &[id]))
        }
        Scope::Level { id } => {
            if !gating::is_level_open(catalog, profile, id) {
                return ScopeWords::Done(DoneReason::ScopeLocked);
            }
            let open: Vec<GroupId> = catalog
                .level(id)
                .map(|level| level.groups.as_slice())
                .unwrap_or_default()
                .iter()
                .copied()
                .filter(|group_id| gating::is_group_open(catalog, profile, *group_id))
                .collect();
            ScopeWords::Words(words_of_groups(catalog, &open))
        }
        Scope::MasteredReview => {
            if profile.review_queue.is_empty() {
                return ScopeWords::Done(DoneReason::ReviewQueueEmpty);
            }
            let reachable: HashSet<WordId> =
                words_of_groups(catalog, &gating::open_groups(catalog, profile))
                    .into_iter()
                    .collect();
            ScopeWords::Words(
                profile
                    .review_queue
                    .iter()
                    .copied()
                    .filter(|word_id| reachable.contains(word_id))
                    .collect(),
            )
        }
    }
}

fn words_of_groups(catalog: &ContentCatalog, group_ids: &[GroupId]) -> Vec<WordId> {
    group_ids
        .iter()
        .filter_map(|group_id| catalog.group(*group_id))
        .flat_map(|group| group.words.iter().map(|word| word.id))
        .collect()
}

/// Deduplicates and keeps words with a text in both languages.
fn presentable(
    catalog: &ContentCatalog,
    target_lang: &str,
    native_lang: &str,
    words: Vec<WordId>,
) -> Vec<WordId> {
    let mut seen = HashSet::new();
    words
        .into_iter()
        .filter(|word_id| seen.insert(*word_id))
        .filter(|word_id| {
            catalog.word_text(target_lang, *word_id).is_some()
                && catalog.word_text(native_lang, *word_id).is_some()
        })
        .collect()
}

fn bucket_by_rank(
    profile: &LearnerProfile,
    candidates: &[WordId],
    config: &EngineConfig,
) -> [Vec<WordId>; 5] {
    let mut buckets: [Vec<WordId>; 5] = Default::default();
    for word_id in candidates {
        let rank: Rank = rank_of(profile.word_score(*word_id), &config.ranks);
        buckets[rank.index()].push(*word_id);
    }
    buckets
}

fn pick_activity<R: Rng + ?Sized>(
    allowed: &[ActivityType],
    rng: &mut R,
) -> Result<ActivityType, EngineError> {
    let mut distinct = Vec::with_capacity(allowed.len());
    for activity in allowed {
        if !distinct.contains(activity) {
            distinct.push(*activity);
        }
    }
    distinct
        .choose(rng)
        .copied()
        .ok_or_else(|| EngineError::Validation("allowedActivities must not be empty".to_string()))
}
