use crate::engine::config::AchievementConfig;
use crate::engine::profile::LearnerProfile;
use crate::engine::types::Achievement;

/// Awards every achievement whose condition now holds and that the profile
/// does not own yet. Returns the newly awarded ones in a stable order.
pub fn award(profile: &mut LearnerProfile, config: &AchievementConfig) -> Vec<Achievement> {
    let mastered = profile.mastered_word_count();
    let candidates = [
        (Achievement::FirstAnswer, profile.words.values().any(|w| w.attempts > 0)),
        (Achievement::FirstWordMastered, mastered > 0),
        (Achievement::FirstGroupUnlocked, profile.unlocked_group_count() > 0),
        (Achievement::FirstLevelUnlocked, profile.unlocked_level_count() > 0),
        (Achievement::Streak7, profile.streak.longest >= config.short_streak_days),
        (Achievement::Streak30, profile.streak.longest >= config.long_streak_days),
        (
            Achievement::HundredWordsMastered,
            mastered >= config.mastered_words_milestone,
        ),
    ];

    candidates
        .into_iter()
        .filter(|(_, earned)| *earned)
        .filter_map(|(achievement, _)| profile.achievements.insert(achievement).then_some(achievement))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::engine::profile::WordStat;

    #[test]
    fn awards_once() {
        let mut profile = LearnerProfile::new("u1", "es", Utc::now());
        let config = AchievementConfig::default();
        assert!(award(&mut profile, &config).is_empty());

        profile.words.insert(
            1,
            WordStat {
                attempts: 1,
                ..WordStat::default()
            },
        );
        assert_eq!(award(&mut profile, &config), vec![Achievement::FirstAnswer]);
        assert!(award(&mut profile, &config).is_empty());
    }

    #[test]
    fn streak_and_mastery_milestones() {
        let mut profile = LearnerProfile::new("u1", "es", Utc::now());
        let config = AchievementConfig {
            short_streak_days: 2,
            long_streak_days: 3,
            mastered_words_milestone: 2,
        };
        profile.streak.longest = 3;
        for id in 1..=2 {
            profile.words.insert(
                id,
                WordStat {
                    attempts: 5,
                    score: 95,
                    reached_mastered: true,
                    ..WordStat::default()
                },
            );
        }

        let awarded = award(&mut profile, &config);
        assert_eq!(
            awarded,
            vec![
                Achievement::FirstAnswer,
                Achievement::FirstWordMastered,
                Achievement::Streak7,
                Achievement::Streak30,
                Achievement::HundredWordsMastered,
            ]
        );
    }
}
