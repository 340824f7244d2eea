use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::validation::is_valid_lang_code;

pub type WordId = u32;
pub type GroupId = u32;
pub type LevelId = u32;

pub const DICTIONARIES_DIR: &str = "dictionaries";
pub const GROUPS_FILE: &str = "groups.json";
pub const LEVELS_FILE: &str = "levels.json";

/// One word of one language. `word == None` marks an entry that has no
/// translation in this language; the id still belongs to the shared id space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub id: WordId,
    pub word: Option<String>,
    #[serde(default)]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub forms: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl DictionaryEntry {
    pub fn text(&self) -> Option<&str> {
        self.word.as_deref().filter(|w| !w.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRef {
    pub id: WordId,
    #[serde(default)]
    pub text: Option<String>,
}

/// A thematic group of words ("ball").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub words: Vec<WordRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: LevelId,
    pub name: String,
    pub groups: Vec<GroupId>,
}

/// Unvalidated catalog content as delivered by the content loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalog {
    pub dictionaries: BTreeMap<String, Vec<DictionaryEntry>>,
    pub groups: Vec<Group>,
    pub levels: Vec<Level>,
}

impl RawCatalog {
    /// Reads `dictionaries/<lang>.json`, `groups.json` and `levels.json`
    /// from a catalog directory.
    pub fn read_dir(dir: &Path) -> Result<Self, CatalogError> {
        let dict_dir = dir.join(DICTIONARIES_DIR);
        let listing = fs::read_dir(&dict_dir).map_err(|source| CatalogError::Io {
            path: dict_dir.display().to_string(),
            source,
        })?;

        let mut paths = Vec::new();
        for item in listing {
            let item = item.map_err(|source| CatalogError::Io {
                path: dict_dir.display().to_string(),
                source,
            })?;
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut dictionaries = BTreeMap::new();
        for path in paths {
            let lang = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string();
            if !is_valid_lang_code(&lang) {
                return Err(CatalogError::InvalidLanguage(lang));
            }
            let entries: Vec<DictionaryEntry> = read_json(&path)?;
            tracing::debug!(lang = %lang, entries = entries.len(), "Dictionary read");
            dictionaries.insert(lang, entries);
        }

        Ok(Self {
            dictionaries,
            groups: read_json(&dir.join(GROUPS_FILE))?,
            levels: read_json(&dir.join(LEVELS_FILE))?,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let raw = fs::read(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| CatalogError::Parse {
        path: path.display().to_string(),
        source,
    })
}
