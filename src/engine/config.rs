use serde::{Deserialize, Serialize};

use crate::engine::types::{ActivityType, Difficulty, Outcome, Rank};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaPair {
    pub correct: i32,
    pub wrong: i32,
}

impl DeltaPair {
    const fn new(correct: i32, wrong: i32) -> Self {
        Self { correct, wrong }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaTable {
    pub easy: DeltaPair,
    pub medium: DeltaPair,
    pub hard: DeltaPair,
}

impl DeltaTable {
    pub fn pair(&self, difficulty: Difficulty) -> DeltaPair {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub multiple_choice: DeltaTable,
    pub fill_in_the_blank: DeltaTable,
    pub flashcard: DeltaTable,
    /// Multiple-choice/easy/correct pays `tapered_easy_delta` once the prior
    /// score is at or above this value.
    pub taper_threshold: u8,
    pub tapered_easy_delta: i32,
    /// Upper bound on the total score a word may gain from flashcards.
    pub flashcard_gain_cap: u8,
    /// Fraction of the fill-in-the-blank correct delta granted on a misspell override.
    pub misspell_reclaim_factor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            multiple_choice: DeltaTable {
                easy: DeltaPair::new(2, -2),
                medium: DeltaPair::new(4, -3),
                hard: DeltaPair::new(6, -4),
            },
            fill_in_the_blank: DeltaTable {
                easy: DeltaPair::new(4, -3),
                medium: DeltaPair::new(6, -3),
                hard: DeltaPair::new(8, -4),
            },
            flashcard: DeltaTable {
                easy: DeltaPair::new(2, -1),
                medium: DeltaPair::new(3, -2),
                hard: DeltaPair::new(4, -2),
            },
            taper_threshold: 60,
            tapered_easy_delta: 1,
            flashcard_gain_cap: 30,
            misspell_reclaim_factor: 0.5,
        }
    }
}

impl ScoringConfig {
    pub fn table(&self, activity: ActivityType) -> &DeltaTable {
        match activity {
            ActivityType::MultipleChoice => &self.multiple_choice,
            ActivityType::FillInTheBlank => &self.fill_in_the_blank,
            ActivityType::Flashcard => &self.flashcard,
        }
    }

    pub fn base_delta(&self, activity: ActivityType, difficulty: Difficulty, outcome: Outcome) -> i32 {
        let pair = self.table(activity).pair(difficulty);
        match outcome {
            Outcome::Correct => pair.correct,
            Outcome::Wrong => pair.wrong,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankWeights {
    pub new: f64,
    pub learning: f64,
    pub practicing: f64,
    pub mastering: f64,
    pub mastered: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            new: 30.0,
            learning: 30.0,
            practicing: 20.0,
            mastering: 15.0,
            mastered: 5.0,
        }
    }
}

/// Inclusive lower bounds of each rank above NEW. NEW starts at 0 and
/// MASTERED ends at 100, so the ranges are contiguous and exhaustive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankConfig {
    pub learning_min: u8,
    pub practicing_min: u8,
    pub mastering_min: u8,
    pub mastered_min: u8,
    pub weights: RankWeights,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            learning_min: 26,
            practicing_min: 51,
            mastering_min: 76,
            mastered_min: 90,
            weights: RankWeights::default(),
        }
    }
}

impl RankConfig {
    pub fn base_weight(&self, rank: Rank) -> f64 {
        match rank {
            Rank::New => self.weights.new,
            Rank::Learning => self.weights.learning,
            Rank::Practicing => self.weights.practicing,
            Rank::Mastering => self.weights.mastering,
            Rank::Mastered => self.weights.mastered,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockConfig {
    /// A group unlocks once its average is at or above this value.
    pub group_threshold: f64,
    /// A level unlocks once the mean of its groups' averages is at or above this value.
    pub level_threshold: f64,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            group_threshold: 50.0,
            level_threshold: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionConfig {
    /// Total number of choices (one correct) in a multiple-choice question.
    pub mc_choice_count: usize,
    /// Prompt language used when a request does not name one.
    pub default_native_lang: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mc_choice_count: 4,
            default_native_lang: crate::constants::DEFAULT_NATIVE_LANG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementConfig {
    pub short_streak_days: u32,
    pub long_streak_days: u32,
    pub mastered_words_milestone: usize,
}

impl Default for AchievementConfig {
    fn default() -> Self {
        Self {
            short_streak_days: 7,
            long_streak_days: 30,
            mastered_words_milestone: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub ranks: RankConfig,
    #[serde(default)]
    pub unlock: UnlockConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub achievements: AchievementConfig,
}

impl EngineConfig {
    pub fn from_env(env_config: &crate::config::EngineEnvConfig) -> Self {
        let mut config = Self::default();
        config.unlock.group_threshold = env_config.group_unlock_threshold;
        config.unlock.level_threshold = env_config.level_unlock_threshold;
        config.selection.mc_choice_count = env_config.mc_choice_count;
        config.scoring.misspell_reclaim_factor = env_config.misspell_reclaim_factor;
        config.selection.default_native_lang = env_config.default_native_lang.clone();
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        let s = &self.scoring;
        for activity in ActivityType::ALL {
            for difficulty in Difficulty::ALL {
                let pair = s.table(activity).pair(difficulty);
                if pair.correct < 0 || pair.wrong > 0 {
                    return Err(format!(
                        "scoring.{}: correct delta must be >= 0 and wrong delta <= 0",
                        activity.as_str()
                    ));
                }
            }
        }
        if s.taper_threshold > 100 {
            return Err("scoring.taper_threshold must be in [0,100]".to_string());
        }
        if s.tapered_easy_delta < 0 {
            return Err("scoring.tapered_easy_delta must be >= 0".to_string());
        }
        if s.flashcard_gain_cap > 100 {
            return Err("scoring.flashcard_gain_cap must be in [0,100]".to_string());
        }
        if !(0.0..=1.0).contains(&s.misspell_reclaim_factor) {
            return Err("scoring.misspell_reclaim_factor must be in [0,1]".to_string());
        }

        // 等级边界必须严格递增并覆盖 0..=100
        let r = &self.ranks;
        if !(r.learning_min > 0
            && r.learning_min < r.practicing_min
            && r.practicing_min < r.mastering_min
            && r.mastering_min < r.mastered_min
            && r.mastered_min <= 100)
        {
            return Err("ranks: boundaries must satisfy 0 < learning < practicing < mastering < mastered <= 100".to_string());
        }
        let weights: Vec<f64> = Rank::ALL.iter().map(|rank| r.base_weight(*rank)).collect();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("ranks.weights must be finite and >= 0".to_string());
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err("ranks.weights sum must be > 0".to_string());
        }
        if s.flashcard_gain_cap >= r.mastered_min {
            return Err("scoring.flashcard_gain_cap must be below ranks.mastered_min".to_string());
        }

        if !(0.0..=100.0).contains(&self.unlock.group_threshold)
            || !(0.0..=100.0).contains(&self.unlock.level_threshold)
        {
            return Err("unlock thresholds must be in [0,100]".to_string());
        }

        if !(2..=10).contains(&self.selection.mc_choice_count) {
            return Err("selection.mc_choice_count must be in [2,10]".to_string());
        }
        if !crate::validation::is_valid_lang_code(&self.selection.default_native_lang) {
            return Err("selection.default_native_lang must be a language code".to_string());
        }

        let a = &self.achievements;
        if a.short_streak_days == 0 || a.long_streak_days <= a.short_streak_days {
            return Err("achievements: streak milestones must satisfy 0 < short < long".to_string());
        }
        if a.mastered_words_milestone == 0 {
            return Err("achievements.mastered_words_milestone must be > 0".to_string());
        }

        Ok(())
    }
}
