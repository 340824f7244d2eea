//! Referential integrity checks run once before the catalog is indexed.

use std::collections::{HashMap, HashSet};

use super::records::{GroupId, LevelId, RawCatalog, WordId};
use super::CatalogError;
use crate::validation::is_valid_lang_code;

pub(super) fn check(raw: &RawCatalog) -> Result<(), CatalogError> {
    if raw.dictionaries.is_empty() {
        return Err(CatalogError::Empty);
    }

    // 所有语言词典 id 的并集即为规范 id 空间
    let mut canonical: HashSet<WordId> = HashSet::new();
    for (lang, entries) in &raw.dictionaries {
        if !is_valid_lang_code(lang) {
            return Err(CatalogError::InvalidLanguage(lang.clone()));
        }
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(entry.id) {
                return Err(CatalogError::DuplicateWord {
                    lang: lang.clone(),
                    word_id: entry.id,
                });
            }
            canonical.insert(entry.id);
        }
    }

    let mut group_ids: HashSet<GroupId> = HashSet::with_capacity(raw.groups.len());
    for group in &raw.groups {
        if !group_ids.insert(group.id) {
            return Err(CatalogError::DuplicateGroup(group.id));
        }
        if group.words.is_empty() {
            return Err(CatalogError::EmptyGroup(group.id));
        }
        let mut seen = HashSet::with_capacity(group.words.len());
        for word in &group.words {
            if !canonical.contains(&word.id) {
                return Err(CatalogError::UnknownWord {
                    group_id: group.id,
                    word_id: word.id,
                });
            }
            if !seen.insert(word.id) {
                return Err(CatalogError::DuplicateGroupWord {
                    group_id: group.id,
                    word_id: word.id,
                });
            }
        }
    }

    let mut level_ids: HashSet<LevelId> = HashSet::with_capacity(raw.levels.len());
    let mut owner: HashMap<GroupId, LevelId> = HashMap::with_capacity(raw.groups.len());
    for level in &raw.levels {
        if !level_ids.insert(level.id) {
            return Err(CatalogError::DuplicateLevel(level.id));
        }
        if level.groups.is_empty() {
            return Err(CatalogError::EmptyLevel(level.id));
        }
        for group_id in &level.groups {
            if !group_ids.contains(group_id) {
                return Err(CatalogError::UnknownGroup {
                    level_id: level.id,
                    group_id: *group_id,
                });
            }
            if let Some(first) = owner.insert(*group_id, level.id) {
                return Err(CatalogError::GroupInMultipleLevels {
                    group_id: *group_id,
                    first,
                    second: level.id,
                });
            }
        }
    }

    for group in &raw.groups {
        if !owner.contains_key(&group.id) {
            return Err(CatalogError::GroupWithoutLevel(group.id));
        }
    }

    Ok(())
}
