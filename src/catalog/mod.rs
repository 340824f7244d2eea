//! Static content catalog: per-language dictionaries, groups and levels,
//! validated and indexed once at startup and shared read-only afterwards.

pub mod records;
mod validate;

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

pub use records::{
    DictionaryEntry, Group, GroupId, Level, LevelId, RawCatalog, WordId, WordRef,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog has no dictionaries")]
    Empty,
    #[error("invalid language code: {0}")]
    InvalidLanguage(String),
    #[error("duplicate word id {word_id} in dictionary {lang}")]
    DuplicateWord { lang: String, word_id: WordId },
    #[error("duplicate group id {0}")]
    DuplicateGroup(GroupId),
    #[error("duplicate level id {0}")]
    DuplicateLevel(LevelId),
    #[error("group {0} has no words")]
    EmptyGroup(GroupId),
    #[error("level {0} has no groups")]
    EmptyLevel(LevelId),
    #[error("group {group_id} references unknown word {word_id}")]
    UnknownWord { group_id: GroupId, word_id: WordId },
    #[error("group {group_id} lists word {word_id} more than once")]
    DuplicateGroupWord { group_id: GroupId, word_id: WordId },
    #[error("level {level_id} references unknown group {group_id}")]
    UnknownGroup { level_id: LevelId, group_id: GroupId },
    #[error("group {group_id} belongs to both level {first} and level {second}")]
    GroupInMultipleLevels {
        group_id: GroupId,
        first: LevelId,
        second: LevelId,
    },
    #[error("group {0} does not belong to any level")]
    GroupWithoutLevel(GroupId),
}

#[derive(Debug)]
struct Dictionary {
    entries: Vec<DictionaryEntry>,
    by_id: HashMap<WordId, usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub languages: Vec<LanguageSummary>,
    pub group_count: usize,
    pub level_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSummary {
    pub code: String,
    pub entries: usize,
    pub translated: usize,
}

#[derive(Debug)]
pub struct ContentCatalog {
    languages: Vec<String>,
    dictionaries: HashMap<String, Dictionary>,
    groups: HashMap<GroupId, Group>,
    levels: Vec<Level>,
    level_index: HashMap<LevelId, usize>,
    word_groups: HashMap<WordId, Vec<GroupId>>,
    group_level: HashMap<GroupId, LevelId>,
    group_position: HashMap<GroupId, usize>,
}

impl ContentCatalog {
    /// Validates the raw records and builds every lookup. Any referential
    /// defect is returned as an error; there is no partially-loaded catalog.
    pub fn load(raw: RawCatalog) -> Result<Self, CatalogError> {
        validate::check(&raw)?;

        let mut languages = Vec::with_capacity(raw.dictionaries.len());
        let mut dictionaries = HashMap::with_capacity(raw.dictionaries.len());
        for (lang, entries) in raw.dictionaries {
            let by_id = entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| (entry.id, idx))
                .collect();
            languages.push(lang.clone());
            dictionaries.insert(lang, Dictionary { entries, by_id });
        }

        let mut word_groups: HashMap<WordId, Vec<GroupId>> = HashMap::new();
        for group in &raw.groups {
            for word in &group.words {
                word_groups.entry(word.id).or_default().push(group.id);
            }
        }

        let mut level_index = HashMap::with_capacity(raw.levels.len());
        let mut group_level = HashMap::with_capacity(raw.groups.len());
        let mut group_position = HashMap::with_capacity(raw.groups.len());
        for (idx, level) in raw.levels.iter().enumerate() {
            level_index.insert(level.id, idx);
            for (pos, group_id) in level.groups.iter().enumerate() {
                group_level.insert(*group_id, level.id);
                group_position.insert(*group_id, pos);
            }
        }

        let groups = raw
            .groups
            .into_iter()
            .map(|group| (group.id, group))
            .collect::<HashMap<_, _>>();

        let catalog = Self {
            languages,
            dictionaries,
            groups,
            levels: raw.levels,
            level_index,
            word_groups,
            group_level,
            group_position,
        };

        tracing::info!(
            languages = catalog.languages.len(),
            groups = catalog.groups.len(),
            levels = catalog.levels.len(),
            "Content catalog loaded"
        );

        Ok(catalog)
    }

    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        Self::load(RawCatalog::read_dir(dir)?)
    }

    /// Language codes in sorted order.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn has_language(&self, lang: &str) -> bool {
        self.dictionaries.contains_key(lang)
    }

    pub fn word(&self, lang: &str, word_id: WordId) -> Option<&DictionaryEntry> {
        let dict = self.dictionaries.get(lang)?;
        dict.by_id.get(&word_id).map(|idx| &dict.entries[*idx])
    }

    /// Text of a word in a language; `None` for unknown or untranslatable entries.
    pub fn word_text(&self, lang: &str, word_id: WordId) -> Option<&str> {
        self.word(lang, word_id).and_then(DictionaryEntry::text)
    }

    pub fn entries(&self, lang: &str) -> &[DictionaryEntry] {
        self.dictionaries
            .get(lang)
            .map(|dict| dict.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn group(&self, group_id: GroupId) -> Option<&Group> {
        self.groups.get(&group_id)
    }

    pub fn level(&self, level_id: LevelId) -> Option<&Level> {
        self.level_index.get(&level_id).map(|idx| &self.levels[*idx])
    }

    /// Levels in catalog order.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn groups_of_word(&self, word_id: WordId) -> &[GroupId] {
        self.word_groups
            .get(&word_id)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn level_of_group(&self, group_id: GroupId) -> Option<LevelId> {
        self.group_level.get(&group_id).copied()
    }

    /// Zero-based position of a level in catalog order.
    pub fn level_position(&self, level_id: LevelId) -> Option<usize> {
        self.level_index.get(&level_id).copied()
    }

    /// Zero-based position of a group inside its level.
    pub fn group_position(&self, group_id: GroupId) -> Option<usize> {
        self.group_position.get(&group_id).copied()
    }

    pub fn summary(&self) -> CatalogSummary {
        let languages = self
            .languages
            .iter()
            .map(|code| {
                let entries = self.entries(code);
                LanguageSummary {
                    code: code.clone(),
                    entries: entries.len(),
                    translated: entries.iter().filter(|e| e.text().is_some()).count(),
                }
            })
            .collect();

        CatalogSummary {
            languages,
            group_count: self.groups.len(),
            level_count: self.levels.len(),
        }
    }
}
