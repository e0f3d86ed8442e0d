//! Vocabulary entry model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Store-assigned entry identifier (max existing + 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

impl EntryId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Part-of-speech tag to comma-joined source-language glosses
pub type SourceMeanings = BTreeMap<String, String>;

/// A vocabulary entry in a user-scoped store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// Unique within the store
    pub headword: String,
    pub meanings_by_source_lang: SourceMeanings,
    pub meanings_by_target_lang: Vec<String>,
    pub parts_of_speech: Vec<String>,
    /// Refreshed on every create/update
    pub updated_at: String,
    /// False after any local mutation until a push is accepted
    pub is_synced: bool,
    /// False until translation backfill enriched the entry
    pub is_translated: bool,
}

/// Caller-supplied data for creating an entry.
///
/// `id`, `updated_at` and `is_synced` are owned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub headword: String,
    #[serde(default)]
    pub meanings_by_source_lang: SourceMeanings,
    #[serde(default)]
    pub meanings_by_target_lang: Vec<String>,
    #[serde(default)]
    pub parts_of_speech: Vec<String>,
    #[serde(default)]
    pub is_translated: bool,
}

impl NewEntry {
    #[must_use]
    pub fn new(headword: impl Into<String>) -> Self {
        Self {
            headword: headword.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_parts_of_speech<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parts_of_speech = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_target_meanings<I, S>(mut self, glosses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meanings_by_target_lang = glosses.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_source_meaning(
        mut self,
        part_of_speech: impl Into<String>,
        glosses: impl Into<String>,
    ) -> Self {
        self.meanings_by_source_lang
            .insert(part_of_speech.into(), glosses.into());
        self
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPatch {
    pub headword: Option<String>,
    pub meanings_by_source_lang: Option<SourceMeanings>,
    pub meanings_by_target_lang: Option<Vec<String>>,
    pub parts_of_speech: Option<Vec<String>>,
    pub is_translated: Option<bool>,
}

impl EntryPatch {
    #[must_use]
    pub fn headword(mut self, headword: impl Into<String>) -> Self {
        self.headword = Some(headword.into());
        self
    }

    #[must_use]
    pub fn parts_of_speech<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parts_of_speech = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn target_meanings<I, S>(mut self, glosses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meanings_by_target_lang = Some(glosses.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn source_meanings(mut self, meanings: SourceMeanings) -> Self {
        self.meanings_by_source_lang = Some(meanings);
        self
    }

    #[must_use]
    pub const fn translated(mut self, is_translated: bool) -> Self {
        self.is_translated = Some(is_translated);
        self
    }

    /// Apply provided fields onto a copy of `entry`.
    #[must_use]
    pub fn apply_to(&self, entry: &Entry) -> Entry {
        let mut merged = entry.clone();
        if let Some(headword) = &self.headword {
            merged.headword.clone_from(headword);
        }
        if let Some(meanings) = &self.meanings_by_source_lang {
            merged.meanings_by_source_lang.clone_from(meanings);
        }
        if let Some(glosses) = &self.meanings_by_target_lang {
            merged.meanings_by_target_lang.clone_from(glosses);
        }
        if let Some(tags) = &self.parts_of_speech {
            merged.parts_of_speech.clone_from(tags);
        }
        if let Some(is_translated) = self.is_translated {
            merged.is_translated = is_translated;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entry {
        Entry {
            id: EntryId::new(1),
            headword: "sugar".to_string(),
            meanings_by_source_lang: SourceMeanings::new(),
            meanings_by_target_lang: vec!["糖".to_string()],
            parts_of_speech: vec!["noun".to_string()],
            updated_at: "2024-01-01 00:00:00.000".to_string(),
            is_synced: true,
            is_translated: false,
        }
    }

    #[test]
    fn entry_id_parses_trimmed_integer() {
        assert_eq!(" 42 ".parse::<EntryId>().unwrap(), EntryId::new(42));
        assert!("abc".parse::<EntryId>().is_err());
    }

    #[test]
    fn patch_applies_only_provided_fields() {
        let entry = sample();
        let patched = EntryPatch::default()
            .parts_of_speech(["noun", "verb"])
            .apply_to(&entry);

        assert_eq!(patched.parts_of_speech, vec!["noun", "verb"]);
        assert_eq!(patched.headword, "sugar");
        assert_eq!(patched.meanings_by_target_lang, vec!["糖"]);
        assert!(!patched.is_translated);
    }

    #[test]
    fn new_entry_builder_collects_fields() {
        let entry = NewEntry::new("stand")
            .with_parts_of_speech(["Verb"])
            .with_source_meaning("Verb", "rise,be upright")
            .with_target_meanings(["站"]);

        assert_eq!(entry.headword, "stand");
        assert_eq!(entry.meanings_by_source_lang["Verb"], "rise,be upright");
        assert!(!entry.is_translated);
    }
}
