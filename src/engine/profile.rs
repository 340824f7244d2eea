//! Per-learner, per-language progress state. One `LearnerProfile` owns every
//! word, group and level statistic for its (learner, language) pair and is
//! persisted as a single record.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{GroupId, LevelId, WordId};
use crate::engine::types::{Achievement, ActivityType, Difficulty, Outcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub activity: ActivityType,
    pub difficulty: Difficulty,
    pub outcome: Outcome,
    pub delta: i32,
    pub misspell_override: bool,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStat {
    pub score: u8,
    pub attempts: u32,
    pub correct: u32,
    pub flashcard_gain: u8,
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Set once the score has been in the MASTERED rank.
    #[serde(default)]
    pub reached_mastered: bool,
    #[serde(default)]
    pub last_attempt: Option<AttemptSummary>,
}

/// Cached aggregate over the words of one group that the learner has seen.
/// `average == sum / count` when `count > 0`, otherwise 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStat {
    pub sum: u32,
    pub count: u32,
    pub average: f64,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl GroupStat {
    pub fn rederive(&mut self) {
        self.average = if self.count > 0 {
            f64::from(self.sum) / f64::from(self.count)
        } else {
            0.0
        };
    }
}

/// Cached aggregate over the averages of every group of one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelStat {
    pub sum: f64,
    pub count: u32,
    pub average: f64,
    pub unlocked: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LevelStat {
    pub fn rederive(&mut self) {
        self.average = if self.count > 0 {
            self.sum / f64::from(self.count)
        } else {
            0.0
        };
    }
}

/// Consecutive UTC days with at least one answered item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakCounter {
    pub current: u32,
    pub longest: u32,
    pub last_active_day: Option<NaiveDate>,
}

impl StreakCounter {
    pub fn record_activity(&mut self, today: NaiveDate) {
        match self.last_active_day {
            Some(last) if last == today => return,
            Some(last) if last.succ_opt() == Some(today) => self.current += 1,
            // activity stamped in the past (clock skew) does not break the streak
            Some(last) if last > today => return,
            _ => self.current = 1,
        }
        self.last_active_day = Some(today);
        self.longest = self.longest.max(self.current);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    pub learner_id: String,
    pub lang: String,
    #[serde(default)]
    pub words: BTreeMap<WordId, WordStat>,
    #[serde(default)]
    pub groups: BTreeMap<GroupId, GroupStat>,
    #[serde(default)]
    pub levels: BTreeMap<LevelId, LevelStat>,
    /// Mastered words answered wrong since, oldest first, without duplicates.
    #[serde(default)]
    pub review_queue: Vec<WordId>,
    #[serde(default)]
    pub streak: StreakCounter,
    #[serde(default)]
    pub achievements: BTreeSet<Achievement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearnerProfile {
    pub fn new(learner_id: &str, lang: &str, now: DateTime<Utc>) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            lang: lang.to_string(),
            words: BTreeMap::new(),
            groups: BTreeMap::new(),
            levels: BTreeMap::new(),
            review_queue: Vec::new(),
            streak: StreakCounter::default(),
            achievements: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Score of a word; unseen words count as 0.
    pub fn word_score(&self, word_id: WordId) -> u8 {
        self.words.get(&word_id).map(|w| w.score).unwrap_or(0)
    }

    pub fn group_average(&self, group_id: GroupId) -> f64 {
        self.groups.get(&group_id).map(|g| g.average).unwrap_or(0.0)
    }

    pub fn group_unlocked(&self, group_id: GroupId) -> bool {
        self.groups.get(&group_id).map(|g| g.unlocked).unwrap_or(false)
    }

    pub fn level_unlocked(&self, level_id: LevelId) -> bool {
        self.levels.get(&level_id).map(|l| l.unlocked).unwrap_or(false)
    }

    /// Returns `true` when the word was not queued yet.
    pub fn enqueue_review(&mut self, word_id: WordId) -> bool {
        if self.review_queue.contains(&word_id) {
            return false;
        }
        self.review_queue.push(word_id);
        true
    }

    pub fn dequeue_review(&mut self, word_id: WordId) -> bool {
        let before = self.review_queue.len();
        self.review_queue.retain(|id| *id != word_id);
        before != self.review_queue.len()
    }

    pub fn unlocked_group_count(&self) -> usize {
        self.groups.values().filter(|g| g.unlocked).count()
    }

    pub fn unlocked_level_count(&self) -> usize {
        self.levels.values().filter(|l| l.unlocked).count()
    }

    pub fn mastered_word_count(&self) -> usize {
        self.words.values().filter(|w| w.reached_mastered).count()
    }
}
