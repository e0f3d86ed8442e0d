//! Replayable mutation log model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::entry::{Entry, EntryId, SourceMeanings};

/// Kind of a logged mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    /// Column value in the local `operations` table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Operation name understood by the remote sync endpoint.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Create => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" | "add" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown operation kind '{other}'")),
        }
    }
}

/// A queued mutation awaiting push to the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Replay order
    pub sequence_id: i64,
    pub kind: OperationKind,
    pub user_id: String,
    pub entry_id: EntryId,
    /// Denormalized so the server can reference the entry without a join
    pub headword: String,
    pub payload: serde_json::Value,
    pub timestamp: String,
}

/// Full entry snapshot carried by create/update operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPayload {
    #[serde(rename = "wordid")]
    pub id: EntryId,
    #[serde(rename = "word")]
    pub headword: String,
    #[serde(rename = "en_meaning")]
    pub meanings_by_source_lang: SourceMeanings,
    #[serde(rename = "ch_meaning")]
    pub meanings_by_target_lang: Vec<String>,
    #[serde(rename = "part_of_speech")]
    pub parts_of_speech: Vec<String>,
    #[serde(rename = "wordtime")]
    pub updated_at: String,
}

impl From<&Entry> for EntryPayload {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            headword: entry.headword.clone(),
            meanings_by_source_lang: entry.meanings_by_source_lang.clone(),
            meanings_by_target_lang: entry.meanings_by_target_lang.clone(),
            parts_of_speech: entry.parts_of_speech.clone(),
            updated_at: entry.updated_at.clone(),
        }
    }
}

/// Identity and metadata carried by delete operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePayload {
    #[serde(rename = "wordid")]
    pub id: EntryId,
    #[serde(rename = "word")]
    pub headword: String,
    pub operation: OperationKind,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_round_trips_through_column_value() {
        for kind in [
            OperationKind::Create,
            OperationKind::Update,
            OperationKind::Delete,
        ] {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
        assert!("mark".parse::<OperationKind>().is_err());
    }

    #[test]
    fn create_is_sent_as_add() {
        assert_eq!(OperationKind::Create.wire_name(), "add");
        assert_eq!("add".parse::<OperationKind>().unwrap(), OperationKind::Create);
    }

    #[test]
    fn entry_payload_uses_remote_field_names() {
        let entry = Entry {
            id: EntryId::new(3),
            headword: "sugar".to_string(),
            meanings_by_source_lang: SourceMeanings::from([(
                "Noun".to_string(),
                "sweet substance".to_string(),
            )]),
            meanings_by_target_lang: vec!["糖".to_string()],
            parts_of_speech: vec!["Noun".to_string()],
            updated_at: "2024-05-01 10:00:00.000".to_string(),
            is_synced: false,
            is_translated: true,
        };

        let value = serde_json::to_value(EntryPayload::from(&entry)).unwrap();
        assert_eq!(
            value,
            json!({
                "wordid": 3,
                "word": "sugar",
                "en_meaning": {"Noun": "sweet substance"},
                "ch_meaning": ["糖"],
                "part_of_speech": ["Noun"],
                "wordtime": "2024-05-01 10:00:00.000",
            })
        );
    }
}
