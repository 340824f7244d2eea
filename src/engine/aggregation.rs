//! Applies one answered item to a learner profile: word score, group and
//! level aggregates, unlock events, review queue, streak and achievements.
//!
//! All checks run before the first mutation, so an `Err` leaves the profile
//! untouched.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{ContentCatalog, GroupId, LevelId};
use crate::engine::config::{EngineConfig, UnlockConfig};
use crate::engine::gating;
use crate::engine::profile::{AttemptSummary, LearnerProfile, WordStat};
use crate::engine::rank::rank_of;
use crate::engine::scoring::{apply_delta, misspell_override_allowed, score_delta, ScoringInput};
use crate::engine::types::{Achievement, AnswerSubmission, Outcome, Rank, UnlockEvent};
use crate::engine::{achievements, EngineError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedResult {
    pub word_id: crate::catalog::WordId,
    pub previous_score: u8,
    pub delta: i32,
    pub rank: Rank,
    pub word_stat: WordStat,
    pub unlock_events: Vec<UnlockEvent>,
    pub new_achievements: Vec<Achievement>,
}

pub fn validate_submission(
    catalog: &ContentCatalog,
    lang: &str,
    submission: &AnswerSubmission,
) -> Result<(), EngineError> {
    if catalog.word_text(lang, submission.word_id).is_none() {
        return Err(EngineError::UnknownWord {
            lang: lang.to_string(),
            word_id: submission.word_id,
        });
    }
    if submission.misspell_override
        && !misspell_override_allowed(submission.activity, submission.outcome)
    {
        return Err(EngineError::Validation(
            "misspellOverride is only valid on a wrong fillInTheBlank answer".to_string(),
        ));
    }
    Ok(())
}

pub fn apply_result(
    catalog: &ContentCatalog,
    profile: &mut LearnerProfile,
    submission: &AnswerSubmission,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<AppliedResult, EngineError> {
    validate_submission(catalog, &profile.lang, submission)?;

    let word_id = submission.word_id;
    let first_exposure = !profile.words.contains_key(&word_id);
    let stat = profile.words.entry(word_id).or_default();
    let previous_score = stat.score;

    let change = score_delta(
        &ScoringInput {
            activity: submission.activity,
            difficulty: submission.difficulty,
            outcome: submission.outcome,
            prior_score: previous_score,
            flashcard_gain: stat.flashcard_gain,
            misspell_override: submission.misspell_override,
        },
        &config.scoring,
    );

    stat.score = apply_delta(previous_score, change.delta);
    stat.attempts = stat.attempts.saturating_add(1);
    if change.credited {
        stat.correct = stat.correct.saturating_add(1);
    }
    stat.flashcard_gain = stat
        .flashcard_gain
        .saturating_add(change.flashcard_gain)
        .min(config.scoring.flashcard_gain_cap);
    stat.last_seen_at = Some(now);
    stat.last_attempt = Some(AttemptSummary {
        activity: submission.activity,
        difficulty: submission.difficulty,
        outcome: submission.outcome,
        delta: change.delta,
        misspell_override: submission.misspell_override,
        at: now,
    });

    let new_score = stat.score;
    let rank = rank_of(new_score, &config.ranks);
    let was_mastered = stat.reached_mastered;
    if rank == Rank::Mastered {
        stat.reached_mastered = true;
    }
    let word_stat = stat.clone();

    if was_mastered && submission.outcome == Outcome::Wrong && !change.credited {
        if profile.enqueue_review(word_id) {
            tracing::debug!(word_id, "word queued for mastered review");
        }
    } else if rank == Rank::Mastered && change.credited && profile.dequeue_review(word_id) {
        tracing::debug!(word_id, "word left mastered review");
    }

    let mut unlock_events = Vec::new();
    let affected_levels = update_groups(
        catalog,
        profile,
        word_id,
        first_exposure,
        previous_score,
        new_score,
        &config.unlock,
        now,
        &mut unlock_events,
    );
    for level_id in affected_levels {
        update_level(catalog, profile, level_id, &config.unlock, now, &mut unlock_events);
    }

    profile.streak.record_activity(now.date_naive());
    let new_achievements = achievements::award(profile, &config.achievements);
    profile.updated_at = now;

    Ok(AppliedResult {
        word_id,
        previous_score,
        delta: i32::from(new_score) - i32::from(previous_score),
        rank,
        word_stat,
        unlock_events,
        new_achievements,
    })
}

/// Updates every group owning the word and returns, in catalog order, the
/// owning levels that have at least one unlocked group.
#[allow(clippy::too_many_arguments)]
fn update_groups(
    catalog: &ContentCatalog,
    profile: &mut LearnerProfile,
    word_id: crate::catalog::WordId,
    first_exposure: bool,
    previous_score: u8,
    new_score: u8,
    unlock: &UnlockConfig,
    now: DateTime<Utc>,
    events: &mut Vec<UnlockEvent>,
) -> Vec<LevelId> {
    let mut owners: Vec<GroupId> = catalog.groups_of_word(word_id).to_vec();
    owners.sort_by_key(|group_id| catalog_order(catalog, *group_id));

    let mut levels = BTreeSet::new();
    for group_id in owners {
        let Some(level_id) = catalog.level_of_group(group_id) else {
            continue;
        };
        let group = profile.groups.entry(group_id).or_default();
        if first_exposure {
            group.count += 1;
            group.sum += u32::from(new_score);
        } else {
            group.sum = (i64::from(group.sum) + i64::from(new_score) - i64::from(previous_score))
                .max(0) as u32;
        }
        group.rederive();

        if !group.unlocked && group.average >= unlock.group_threshold {
            group.unlocked = true;
            group.unlocked_at = Some(now);
            tracing::info!(group_id, level_id, average = group.average, "group unlocked");
            events.push(UnlockEvent::GroupUnlocked {
                group_id,
                level_id,
                average: group.average,
                unlocked_at: now,
                opens_group: gating::next_group(catalog, group_id),
            });
        }
        if level_has_unlocked_group(catalog, profile, level_id) {
            levels.insert((catalog.level_position(level_id).unwrap_or(usize::MAX), level_id));
        }
    }
    levels.into_iter().map(|(_, level_id)| level_id).collect()
}

/// A level's aggregate is live once any of its groups is unlocked; from then
/// on every change to a sibling group moves the level average too.
fn level_has_unlocked_group(catalog: &ContentCatalog, profile: &LearnerProfile, level_id: LevelId) -> bool {
    catalog
        .level(level_id)
        .is_some_and(|level| level.groups.iter().any(|group_id| profile.group_unlocked(*group_id)))
}

fn update_level(
    catalog: &ContentCatalog,
    profile: &mut LearnerProfile,
    level_id: LevelId,
    unlock: &UnlockConfig,
    now: DateTime<Utc>,
    events: &mut Vec<UnlockEvent>,
) {
    let Some(level) = catalog.level(level_id) else {
        return;
    };
    let sum: f64 = level
        .groups
        .iter()
        .map(|group_id| profile.group_average(*group_id))
        .sum();

    let stat = profile.levels.entry(level_id).or_default();
    stat.sum = sum;
    stat.count = level.groups.len() as u32;
    stat.rederive();

    if !stat.unlocked && stat.average >= unlock.level_threshold {
        stat.unlocked = true;
        stat.completed_at = Some(now);
        tracing::info!(level_id, average = stat.average, "level unlocked");
        events.push(UnlockEvent::LevelUnlocked {
            level_id,
            average: stat.average,
            completed_at: now,
            opens_level: gating::next_level(catalog, level_id),
        });
    }
}

fn catalog_order(catalog: &ContentCatalog, group_id: GroupId) -> (usize, usize) {
    let level_pos = catalog
        .level_of_group(group_id)
        .and_then(|level_id| catalog.level_position(level_id))
        .unwrap_or(usize::MAX);
    (level_pos, catalog.group_position(group_id).unwrap_or(usize::MAX))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::fixtures::{catalog, entry, group, level, raw_catalog};
    use crate::engine::types::{ActivityType, Difficulty};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
    }

    fn answer(word_id: u32, activity: ActivityType, difficulty: Difficulty, outcome: Outcome) -> AnswerSubmission {
        AnswerSubmission {
            word_id,
            activity,
            difficulty,
            outcome,
            misspell_override: false,
        }
    }

    fn seed_word(profile: &mut LearnerProfile, word_id: u32, score: u8) {
        seed_word_in(&catalog(), profile, word_id, score);
    }

    /// Puts a word at `score` as if it had been answered before.
    fn seed_word_in(catalog: &ContentCatalog, profile: &mut LearnerProfile, word_id: u32, score: u8) {
        profile.words.insert(
            word_id,
            WordStat {
                score,
                ..WordStat::default()
            },
        );
        for group_id in catalog.groups_of_word(word_id) {
            let g = profile.groups.entry(*group_id).or_default();
            g.count += 1;
            g.sum += u32::from(score);
            g.rederive();
        }
    }

    #[test]
    fn fill_medium_correct_moves_24_to_30_learning() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word(&mut profile, 1, 24);

        let result = apply_result(
            &catalog,
            &mut profile,
            &answer(1, ActivityType::FillInTheBlank, Difficulty::Medium, Outcome::Correct),
            &config,
            now(),
        )
        .unwrap();

        assert_eq!(result.word_stat.score, 30);
        assert_eq!(result.rank, Rank::Learning);
        assert_eq!(result.delta, 6);
    }

    #[test]
    fn group_unlocks_at_exactly_threshold_and_stays_unlocked() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word(&mut profile, 1, 40);
        seed_word(&mut profile, 2, 54);

        // 54 + 6 = 60, group 10 = (40 + 60) / 2 = 50
        let result = apply_result(
            &catalog,
            &mut profile,
            &answer(2, ActivityType::FillInTheBlank, Difficulty::Medium, Outcome::Correct),
            &config,
            now(),
        )
        .unwrap();
        assert_eq!(profile.groups[&10].average, 50.0);
        assert!(profile.groups[&10].unlocked);
        assert!(matches!(
            result.unlock_events.as_slice(),
            [UnlockEvent::GroupUnlocked { group_id: 10, opens_group: Some(11), .. }]
        ));

        // a third word at 0: (40 + 60 + 0) / 3 = 33.3, still unlocked
        let result = apply_result(
            &catalog,
            &mut profile,
            &answer(3, ActivityType::MultipleChoice, Difficulty::Easy, Outcome::Wrong),
            &config,
            now(),
        )
        .unwrap();
        assert!((profile.groups[&10].average - 100.0 / 3.0).abs() < 1e-9);
        assert!(profile.groups[&10].unlocked);
        assert!(result.unlock_events.is_empty());
    }

    #[test]
    fn level_recomputes_over_all_groups_and_unlocks() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word(&mut profile, 1, 100);
        seed_word(&mut profile, 4, 96);

        // group 10 = 100 (unlocks), level 100 = (100 + 96) / 2 = 98
        apply_result(
            &catalog,
            &mut profile,
            &answer(1, ActivityType::MultipleChoice, Difficulty::Hard, Outcome::Correct),
            &config,
            now(),
        )
        .unwrap();
        assert!(profile.groups[&10].unlocked);
        assert!(!profile.groups[&11].unlocked);
        assert_eq!(profile.levels[&100].count, 2);
        assert!(profile.levels[&100].unlocked);

        // group 11 unlocks next, level is already unlocked so only one event
        let result = apply_result(
            &catalog,
            &mut profile,
            &answer(4, ActivityType::MultipleChoice, Difficulty::Hard, Outcome::Correct),
            &config,
            now(),
        )
        .unwrap();
        assert_eq!(result.unlock_events.len(), 1);
        assert!(profile.levels[&100].unlocked);
    }

    #[test]
    fn level_stays_locked_while_unlocked_groups_are_too_few() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word(&mut profile, 1, 54);

        let result = apply_result(
            &catalog,
            &mut profile,
            &answer(1, ActivityType::FillInTheBlank, Difficulty::Medium, Outcome::Correct),
            &config,
            now(),
        )
        .unwrap();
        // group 10 = 60, level 100 = (60 + 0) / 2 = 30
        assert_eq!(result.unlock_events.len(), 1);
        assert_eq!(profile.levels[&100].average, 30.0);
        assert!(!profile.levels[&100].unlocked);
    }

    #[test]
    fn locked_sibling_group_moves_level_with_an_unlocked_group() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        for word_id in 1..=3 {
            seed_word(&mut profile, word_id, 70);
        }
        profile.groups.get_mut(&10).unwrap().unlocked = true;
        let level = profile.levels.entry(100).or_default();
        level.sum = 70.0;
        level.count = 2;
        level.rederive();
        seed_word(&mut profile, 4, 36);

        let result = apply_result(
            &catalog,
            &mut profile,
            &answer(4, ActivityType::FillInTheBlank, Difficulty::Hard, Outcome::Correct),
            &config,
            now(),
        )
        .unwrap();

        // group 11 = 44 stays locked, level 100 = (70 + 44) / 2 = 57
        assert!(!profile.groups[&11].unlocked);
        assert_eq!(profile.levels[&100].average, 57.0);
        assert!(profile.levels[&100].unlocked);
        assert_eq!(result.unlock_events.len(), 1);
        assert!(matches!(
            result.unlock_events[0],
            UnlockEvent::LevelUnlocked { level_id: 100, opens_level: Some(200), .. }
        ));
    }

    #[test]
    fn level_without_unlocked_groups_is_not_recomputed() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word(&mut profile, 4, 30);

        apply_result(
            &catalog,
            &mut profile,
            &answer(4, ActivityType::FillInTheBlank, Difficulty::Hard, Outcome::Correct),
            &config,
            now(),
        )
        .unwrap();
        assert!(!profile.levels.contains_key(&100));
    }

    #[test]
    fn events_come_in_catalog_order_for_shared_words() {
        let mut raw = raw_catalog();
        raw.groups = vec![
            group(10, &[1]),
            group(11, &[4, 5, 6]),
            group(20, &[7, 1]),
            group(21, &[10, 11, 12]),
        ];
        raw.levels = vec![level(100, &[10, 11]), level(200, &[20, 21])];
        let catalog = ContentCatalog::load(raw).unwrap();
        let mut config = EngineConfig::default();
        config.unlock.level_threshold = 25.0;
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word_in(&catalog, &mut profile, 1, 0);

        let mut last = Vec::new();
        for _ in 0..9 {
            last = apply_result(
                &catalog,
                &mut profile,
                &answer(1, ActivityType::FillInTheBlank, Difficulty::Hard, Outcome::Correct),
                &config,
                now(),
            )
            .unwrap()
            .unlock_events;
            if !last.is_empty() {
                break;
            }
        }
        // 7 * 8 = 56 crosses 50 for both owning groups at once
        let kinds: Vec<(bool, u32)> = last
            .iter()
            .map(|e| match e {
                UnlockEvent::GroupUnlocked { group_id, .. } => (true, *group_id),
                UnlockEvent::LevelUnlocked { level_id, .. } => (false, *level_id),
            })
            .collect();
        assert_eq!(kinds, vec![(true, 10), (true, 20), (false, 100), (false, 200)]);
    }

    #[test]
    fn misspell_override_reclaims_half_the_correct_delta() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word(&mut profile, 1, 10);

        let mut submission = answer(1, ActivityType::FillInTheBlank, Difficulty::Medium, Outcome::Wrong);
        submission.misspell_override = true;
        let result = apply_result(&catalog, &mut profile, &submission, &config, now()).unwrap();

        assert_eq!(result.word_stat.score, 13);
        assert_eq!(result.word_stat.correct, 1);
    }

    #[test]
    fn invalid_submissions_leave_profile_untouched() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word(&mut profile, 1, 10);
        let before = profile.clone();

        let err = apply_result(
            &catalog,
            &mut profile,
            &answer(999, ActivityType::Flashcard, Difficulty::Easy, Outcome::Correct),
            &config,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnknownWord { word_id: 999, .. }));

        let mut submission = answer(1, ActivityType::MultipleChoice, Difficulty::Easy, Outcome::Wrong);
        submission.misspell_override = true;
        let err = apply_result(&catalog, &mut profile, &submission, &config, now()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        assert_eq!(profile, before);
    }

    #[test]
    fn untranslated_word_is_unknown_in_that_language() {
        let mut raw = raw_catalog();
        raw.dictionaries.get_mut("es").unwrap()[2] = entry(3, None);
        let catalog = ContentCatalog::load(raw).unwrap();
        let mut profile = LearnerProfile::new("u1", "es", now());

        let err = apply_result(
            &catalog,
            &mut profile,
            &answer(3, ActivityType::Flashcard, Difficulty::Easy, Outcome::Correct),
            &EngineConfig::default(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnknownWord { .. }));
    }

    #[test]
    fn mastered_word_answered_wrong_enters_review_until_mastered_again() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word(&mut profile, 1, 88);

        let hard_fill = |outcome| answer(1, ActivityType::FillInTheBlank, Difficulty::Hard, outcome);
        apply_result(&catalog, &mut profile, &hard_fill(Outcome::Correct), &config, now()).unwrap();
        assert!(profile.words[&1].reached_mastered);
        assert!(profile.review_queue.is_empty());

        apply_result(&catalog, &mut profile, &hard_fill(Outcome::Wrong), &config, now()).unwrap();
        apply_result(&catalog, &mut profile, &hard_fill(Outcome::Wrong), &config, now()).unwrap();
        assert_eq!(profile.review_queue, vec![1]);
        assert_eq!(profile.words[&1].score, 88);

        apply_result(&catalog, &mut profile, &hard_fill(Outcome::Correct), &config, now()).unwrap();
        assert!(profile.review_queue.is_empty());
    }

    #[test]
    fn first_answer_and_first_group_achievements() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut profile = LearnerProfile::new("u1", "es", now());
        seed_word(&mut profile, 1, 50);

        let result = apply_result(
            &catalog,
            &mut profile,
            &answer(1, ActivityType::Flashcard, Difficulty::Easy, Outcome::Correct),
            &config,
            now(),
        )
        .unwrap();
        assert!(result.new_achievements.contains(&Achievement::FirstAnswer));
        assert!(result.new_achievements.contains(&Achievement::FirstGroupUnlocked));
        assert_eq!(profile.streak.current, 1);
    }
}
