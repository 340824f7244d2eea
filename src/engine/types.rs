use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{GroupId, LevelId, WordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    MultipleChoice,
    FillInTheBlank,
    Flashcard,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [
        ActivityType::MultipleChoice,
        ActivityType::FillInTheBlank,
        ActivityType::Flashcard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multipleChoice",
            Self::FillInTheBlank => "fillInTheBlank",
            Self::Flashcard => "flashcard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Wrong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    NativeToTarget,
    TargetToNative,
}

/// Direction requested by the caller; `Any` lets the engine flip a coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DirectionPreference {
    NativeToTarget,
    TargetToNative,
    #[default]
    Any,
}

/// Coarse progress classification of a word score, ordered from least to
/// most known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rank {
    New,
    Learning,
    Practicing,
    Mastering,
    Mastered,
}

impl Rank {
    pub const ALL: [Rank; 5] = [
        Rank::New,
        Rank::Learning,
        Rank::Practicing,
        Rank::Mastering,
        Rank::Mastered,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Candidate-restricting context for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Scope {
    #[default]
    Recommended,
    Group {
        id: GroupId,
    },
    Level {
        id: LevelId,
    },
    MasteredReview,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextItemRequest {
    #[serde(default)]
    pub scope: Scope,
    #[serde(default = "all_activities")]
    pub allowed_activities: Vec<ActivityType>,
    #[serde(default)]
    pub direction: DirectionPreference,
    #[serde(default)]
    pub native_lang: Option<String>,
    #[serde(default)]
    pub include_details: bool,
}

fn all_activities() -> Vec<ActivityType> {
    ActivityType::ALL.to_vec()
}

impl Default for NextItemRequest {
    fn default() -> Self {
        Self {
            scope: Scope::Recommended,
            allowed_activities: all_activities(),
            direction: DirectionPreference::Any,
            native_lang: None,
            include_details: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QuestionBody {
    MultipleChoice { choices: Vec<Choice> },
    FillInTheBlank { answer: String },
    Flashcard { front: String, back: String },
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDetails {
    pub part_of_speech: Option<String>,
    pub definition: Option<String>,
    pub examples: Vec<String>,
    pub forms: Vec<String>,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub word_id: WordId,
    pub activity: ActivityType,
    pub direction: Direction,
    pub rank: Rank,
    pub prompt: String,
    pub body: QuestionBody,
    pub details: Option<WordDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DoneReason {
    /// The scope is open but has nothing to present.
    NoCandidates,
    /// The requested group or level is not open for this learner.
    ScopeLocked,
    ReviewQueueEmpty,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NextItem {
    Question(Question),
    Done { reason: DoneReason },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub word_id: WordId,
    pub activity: ActivityType,
    pub difficulty: Difficulty,
    pub outcome: Outcome,
    #[serde(default)]
    pub misspell_override: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum UnlockEvent {
    GroupUnlocked {
        group_id: GroupId,
        level_id: LevelId,
        average: f64,
        unlocked_at: DateTime<Utc>,
        /// Next group of the same level that this unlock opens.
        opens_group: Option<GroupId>,
    },
    LevelUnlocked {
        level_id: LevelId,
        average: f64,
        completed_at: DateTime<Utc>,
        opens_level: Option<LevelId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Achievement {
    FirstAnswer,
    FirstWordMastered,
    FirstGroupUnlocked,
    FirstLevelUnlocked,
    Streak7,
    Streak30,
    HundredWordsMastered,
}
