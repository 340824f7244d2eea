use crate::engine::LearnerProfile;
use crate::store::keys;
use crate::store::{Store, StoreError};

impl Store {
    pub fn load_profile(
        &self,
        learner_id: &str,
        lang: &str,
    ) -> Result<Option<LearnerProfile>, StoreError> {
        let key = keys::profile_key(learner_id, lang)?;
        match self.learner_profiles.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Writes the whole profile under one key, so its word, group and level
    /// statistics are replaced together.
    pub fn save_profile(&self, profile: &LearnerProfile) -> Result<(), StoreError> {
        let key = keys::profile_key(&profile.learner_id, &profile.lang)?;
        self.learner_profiles
            .insert(key.as_bytes(), Self::serialize(profile)?)?;
        Ok(())
    }

    /// Returns `true` when a profile was removed.
    pub fn delete_profile(&self, learner_id: &str, lang: &str) -> Result<bool, StoreError> {
        let key = keys::profile_key(learner_id, lang)?;
        Ok(self.learner_profiles.remove(key.as_bytes())?.is_some())
    }

    /// Languages a learner has a stored profile for, in key order.
    pub fn list_profile_languages(&self, learner_id: &str) -> Result<Vec<String>, StoreError> {
        let prefix = keys::learner_prefix(learner_id)?;
        let mut langs = Vec::new();
        for item in self.learner_profiles.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            let key = String::from_utf8_lossy(&key);
            if let Some(lang) = key.strip_prefix(prefix.as_str()) {
                langs.push(lang.to_string());
            }
        }
        Ok(langs)
    }

    pub fn count_profiles(&self) -> usize {
        self.learner_profiles.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;
    use crate::engine::profile::WordStat;

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let store = Store::open(path.to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_profile_loads_as_none() {
        let (_dir, store) = store();
        assert!(store.load_profile("u1", "es").unwrap().is_none());
    }

    #[test]
    fn save_then_load_returns_same_profile() {
        let (_dir, store) = store();
        let mut profile = LearnerProfile::new("u1", "es", Utc::now());
        profile.words.insert(
            3,
            WordStat {
                score: 61,
                attempts: 9,
                ..WordStat::default()
            },
        );
        profile.enqueue_review(3);
        store.save_profile(&profile).unwrap();

        let loaded = store.load_profile("u1", "es").unwrap().unwrap();
        assert_eq!(loaded, profile);
        assert!(store.load_profile("u1", "fr").unwrap().is_none());
    }

    #[test]
    fn profiles_are_listed_and_deleted_per_learner() {
        let (_dir, store) = store();
        for lang in ["es", "de"] {
            store
                .save_profile(&LearnerProfile::new("u1", lang, Utc::now()))
                .unwrap();
        }
        store
            .save_profile(&LearnerProfile::new("u10", "es", Utc::now()))
            .unwrap();

        assert_eq!(store.list_profile_languages("u1").unwrap(), vec!["de", "es"]);
        assert_eq!(store.count_profiles(), 3);

        assert!(store.delete_profile("u1", "de").unwrap());
        assert!(!store.delete_profile("u1", "de").unwrap());
        assert_eq!(store.list_profile_languages("u1").unwrap(), vec!["es"]);
    }
}
