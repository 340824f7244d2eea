/// 学习者 id 最大长度
pub const MAX_LEARNER_ID_LEN: usize = 64;

/// Lowest and highest word score.
pub const MIN_SCORE: u8 = 0;
pub const MAX_SCORE: u8 = 100;

/// Idle per-profile locks are pruned once the lock map grows past this size.
pub const PROFILE_LOCK_PRUNE_THRESHOLD: usize = 1000;

/// 默认母语（出题时的对照语言）
pub const DEFAULT_NATIVE_LANG: &str = "en";

/// Request bodies are small JSON commands.
pub const MAX_BODY_SIZE: usize = 64 * 1024;
