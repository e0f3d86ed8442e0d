//! Turning translation responses into entry fields, and merging them into
//! what the user already has.

use std::collections::{BTreeMap, HashSet};

use crate::models::{NewEntry, SourceMeanings};
use crate::remote::TranslationResponse;
use crate::util::normalize_gloss;

const MAX_GLOSSES_PER_PART: usize = 3;
const MAX_SATELLITE_GLOSSES: usize = 1;

/// Entry fields derived from one translation response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapedTranslation {
    pub parts_of_speech: Vec<String>,
    pub source_meanings: SourceMeanings,
    pub target_meanings: Vec<String>,
}

impl ShapedTranslation {
    pub fn is_empty(&self) -> bool {
        self.parts_of_speech.is_empty()
            && self.source_meanings.is_empty()
            && self.target_meanings.is_empty()
    }

    /// A translated entry ready for `EntryStore::create`.
    pub fn into_new_entry(self, headword: impl Into<String>) -> NewEntry {
        NewEntry {
            headword: headword.into(),
            meanings_by_source_lang: self.source_meanings,
            meanings_by_target_lang: self.target_meanings,
            parts_of_speech: self.parts_of_speech,
            is_translated: true,
        }
    }
}

/// Expand a WordNet-style tag; unknown tags pass through unchanged.
pub fn expand_part_of_speech(tag: &str) -> String {
    match tag.trim().to_ascii_lowercase().as_str() {
        "n" => "Noun".to_string(),
        "v" => "Verb".to_string(),
        "a" | "s" => "Adjective".to_string(),
        "r" => "Adverb".to_string(),
        _ => tag.trim().to_string(),
    }
}

pub fn shape_translation(response: &TranslationResponse) -> ShapedTranslation {
    let tags: Vec<String> = response
        .part_of_speech
        .iter()
        .map(|tag| tag.trim().to_ascii_lowercase())
        .collect();
    let glosses_at = |index: usize, limit: usize| -> Vec<String> {
        response
            .english_meanings
            .get(index)
            .map(|glosses| {
                glosses
                    .iter()
                    .map(|gloss| gloss.trim())
                    .filter(|gloss| !gloss.is_empty())
                    .take(limit)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let head_adjective = tags.iter().position(|tag| tag == "a");
    let satellite = tags.iter().position(|tag| tag == "s");

    if let (Some(head), Some(satellite)) = (head_adjective, satellite) {
        // Satellites only top up the head adjective's glosses
        let adjective = grouped.entry("Adjective".to_string()).or_default();
        adjective.extend(glosses_at(head, MAX_GLOSSES_PER_PART));
        adjective.extend(glosses_at(satellite, MAX_SATELLITE_GLOSSES));

        for (index, tag) in tags.iter().enumerate() {
            if tag != "a" && tag != "s" {
                grouped
                    .entry(expand_part_of_speech(tag))
                    .or_default()
                    .extend(glosses_at(index, MAX_GLOSSES_PER_PART));
            }
        }
    } else {
        for (index, tag) in tags.iter().enumerate() {
            grouped
                .entry(expand_part_of_speech(tag))
                .or_default()
                .extend(glosses_at(index, MAX_GLOSSES_PER_PART));
        }
    }

    let source_meanings = grouped
        .into_iter()
        .filter(|(_, glosses)| !glosses.is_empty())
        .map(|(tag, glosses)| (tag, glosses.join(",")))
        .collect();

    let parts_of_speech = merge_parts_of_speech(
        &[],
        &response
            .part_of_speech
            .iter()
            .map(|tag| expand_part_of_speech(tag))
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>(),
    );

    let target_meanings = match response.translated_word.trim() {
        "" => Vec::new(),
        translated => vec![translated.to_string()],
    };

    ShapedTranslation {
        parts_of_speech,
        source_meanings,
        target_meanings,
    }
}

/// Set union keyed on normalized form; existing glosses keep their spelling
/// and position, new ones are appended in arrival order.
pub fn merge_glosses(existing: &[String], incoming: &[String]) -> Vec<String> {
    union_by(existing, incoming, normalize_gloss)
}

/// Order-preserving union of part-of-speech tags, case-insensitive.
pub fn merge_parts_of_speech(existing: &[String], incoming: &[String]) -> Vec<String> {
    union_by(existing, incoming, |tag| tag.trim().to_lowercase())
}

/// Per part of speech, union the comma-separated glosses.
pub fn merge_source_meanings(
    existing: &SourceMeanings,
    incoming: &SourceMeanings,
) -> SourceMeanings {
    let mut merged = existing.clone();
    for (tag, glosses) in incoming {
        let incoming = split_glosses(glosses);
        let current = merged
            .get(tag)
            .map(|value| split_glosses(value))
            .unwrap_or_default();
        let combined = merge_glosses(&current, &incoming);
        if !combined.is_empty() {
            merged.insert(tag.clone(), combined.join(","));
        }
    }
    merged
}

fn split_glosses(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|gloss| !gloss.is_empty())
        .map(str::to_string)
        .collect()
}

fn union_by(
    existing: &[String],
    incoming: &[String],
    key: impl Fn(&str) -> String,
) -> Vec<String> {
    let mut seen: HashSet<String> = existing.iter().map(|value| key(value)).collect();
    let mut merged = existing.to_vec();
    for value in incoming {
        let normalized = key(value);
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized) {
            merged.push(value.trim().to_string());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    fn response(tags: &[&str], meanings: &[&[&str]]) -> TranslationResponse {
        TranslationResponse {
            word: "light".to_string(),
            translated_word: "光".to_string(),
            part_of_speech: strings(tags),
            english_meanings: meanings.iter().map(|glosses| strings(glosses)).collect(),
        }
    }

    #[test]
    fn tags_expand_and_unknown_pass_through() {
        assert_eq!(expand_part_of_speech("n"), "Noun");
        assert_eq!(expand_part_of_speech("V"), "Verb");
        assert_eq!(expand_part_of_speech("s"), "Adjective");
        assert_eq!(expand_part_of_speech("r"), "Adverb");
        assert_eq!(expand_part_of_speech("prep"), "prep");
    }

    #[test]
    fn glosses_are_capped_per_part_of_speech() {
        let shaped = shape_translation(&response(
            &["n", "v"],
            &[&["one", "two", "three", "four"], &["run"]],
        ));

        assert_eq!(shaped.parts_of_speech, strings(&["Noun", "Verb"]));
        assert_eq!(shaped.source_meanings["Noun"], "one,two,three");
        assert_eq!(shaped.source_meanings["Verb"], "run");
        assert_eq!(shaped.target_meanings, strings(&["光"]));
    }

    #[test]
    fn satellite_adjective_adds_a_single_gloss() {
        let shaped = shape_translation(&response(
            &["n", "a", "s"],
            &[&["lamp"], &["bright", "pale", "light", "airy"], &["easy", "gentle"]],
        ));

        assert_eq!(shaped.parts_of_speech, strings(&["Noun", "Adjective"]));
        assert_eq!(shaped.source_meanings["Adjective"], "bright,pale,light,easy");
        assert_eq!(shaped.source_meanings["Noun"], "lamp");
    }

    #[test]
    fn blank_translation_yields_no_target_gloss() {
        let mut blank = response(&[], &[]);
        blank.translated_word = "  ".to_string();
        let shaped = shape_translation(&blank);

        assert!(shaped.is_empty());
    }

    #[test]
    fn merge_keeps_user_glosses_and_skips_normalized_duplicates() {
        let merged = merge_glosses(
            &strings(&["Sweet  Stuff", "糖"]),
            &strings(&["sweet stuff", " 糖 ", "砂糖"]),
        );
        assert_eq!(merged, strings(&["Sweet  Stuff", "糖", "砂糖"]));
    }

    #[test]
    fn merge_ignores_blank_incoming() {
        assert_eq!(
            merge_glosses(&strings(&["a"]), &strings(&["", "  "])),
            strings(&["a"])
        );
    }

    #[test]
    fn parts_of_speech_union_preserves_order() {
        let merged = merge_parts_of_speech(
            &strings(&["noun", "Verb"]),
            &strings(&["Noun", "Verb", "Adjective"]),
        );
        assert_eq!(merged, strings(&["noun", "Verb", "Adjective"]));
    }

    #[test]
    fn source_meanings_union_per_part() {
        let existing =
            SourceMeanings::from([("Noun".to_string(), "sweetener, candy".to_string())]);
        let incoming = SourceMeanings::from([
            ("Noun".to_string(), "Candy,sucrose".to_string()),
            ("Verb".to_string(), "sweeten".to_string()),
        ]);

        let merged = merge_source_meanings(&existing, &incoming);

        assert_eq!(merged["Noun"], "sweetener,candy,sucrose");
        assert_eq!(merged["Verb"], "sweeten");
    }

    #[test]
    fn shaped_translation_becomes_translated_entry() {
        let entry = shape_translation(&response(&["n"], &[&["lamp"]])).into_new_entry("light");
        assert_eq!(entry.headword, "light");
        assert!(entry.is_translated);
        assert_eq!(entry.meanings_by_target_lang, strings(&["光"]));
    }
}
