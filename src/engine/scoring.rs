//! Score deltas for a single response. Everything here is pure: the same
//! input always yields the same delta, and every activity/difficulty/outcome
//! combination has one.

use serde::Serialize;

use crate::constants::{MAX_SCORE, MIN_SCORE};
use crate::engine::config::ScoringConfig;
use crate::engine::types::{ActivityType, Difficulty, Outcome};

#[derive(Debug, Clone, Copy)]
pub struct ScoringInput {
    pub activity: ActivityType,
    pub difficulty: Difficulty,
    pub outcome: Outcome,
    pub prior_score: u8,
    /// Score already gained from flashcards on this word.
    pub flashcard_gain: u8,
    pub misspell_override: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreChange {
    pub delta: i32,
    /// Amount to add to the word's flashcard gain counter.
    pub flashcard_gain: u8,
    /// Whether the response counts toward the word's correct counter.
    pub credited: bool,
}

/// A misspell override only makes sense on a wrong fill-in-the-blank answer.
pub fn misspell_override_allowed(activity: ActivityType, outcome: Outcome) -> bool {
    activity == ActivityType::FillInTheBlank && outcome == Outcome::Wrong
}

pub fn score_delta(input: &ScoringInput, config: &ScoringConfig) -> ScoreChange {
    if input.misspell_override && misspell_override_allowed(input.activity, input.outcome) {
        let correct = config.base_delta(input.activity, input.difficulty, Outcome::Correct);
        let reclaimed = (correct as f64 * config.misspell_reclaim_factor).round() as i32;
        return ScoreChange {
            delta: reclaimed,
            flashcard_gain: 0,
            credited: true,
        };
    }

    let base = config.base_delta(input.activity, input.difficulty, input.outcome);

    match (input.activity, input.difficulty, input.outcome) {
        (ActivityType::MultipleChoice, Difficulty::Easy, Outcome::Correct)
            if input.prior_score >= config.taper_threshold =>
        {
            ScoreChange {
                delta: config.tapered_easy_delta,
                flashcard_gain: 0,
                credited: true,
            }
        }
        (ActivityType::Flashcard, _, Outcome::Correct) => {
            let remaining = config.flashcard_gain_cap.saturating_sub(input.flashcard_gain);
            let granted = base.clamp(0, i32::from(remaining));
            ScoreChange {
                delta: granted,
                flashcard_gain: granted as u8,
                credited: true,
            }
        }
        (_, _, outcome) => ScoreChange {
            delta: base,
            flashcard_gain: 0,
            credited: outcome == Outcome::Correct,
        },
    }
}

/// Applies a delta and clamps the result to the score range.
pub fn apply_delta(prior: u8, delta: i32) -> u8 {
    (i32::from(prior) + delta).clamp(i32::from(MIN_SCORE), i32::from(MAX_SCORE)) as u8
}
