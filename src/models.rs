//! Data models for the lab notebook frontend.
//!
//! These are client-side mirrors of resources owned by the lab API. Every
//! field the API may omit defaults when absent so a partial payload still
//! renders.

use serde::{Deserialize, Serialize};

// ============================================================================
// Notebook Entries
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotebookEntry {
    pub id: String,
    pub project_id: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub timestamp: Option<String>,
    pub device: Option<String>,
    pub location: Option<String>,
    pub session_id: Option<String>,
    pub experiment_id: Option<String>,
    pub version: Option<String>,
    pub visibility: Option<String>,
    pub content: Option<String>,
    pub structured: Option<StructuredContent>,
    #[serde(deserialize_with = "null_as_default")]
    pub diffs: Vec<EntryDiff>,
    #[serde(deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

/// The five fixed fields of a structured entry, in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StructuredContent {
    pub observation: String,
    pub hypothesis: String,
    pub method: String,
    pub result: String,
    pub conclusion: String,
}

impl StructuredContent {
    /// Field labels paired with values, in the fixed order used for both
    /// preview and save.
    pub fn labeled_fields(&self) -> [(&'static str, &str); 5] {
        [
            ("Observation", self.observation.as_str()),
            ("Hypothesis", self.hypothesis.as_str()),
            ("Method", self.method.as_str()),
            ("Result", self.result.as_str()),
            ("Conclusion", self.conclusion.as_str()),
        ]
    }
}

/// A server-computed unified diff recorded when an entry was edited.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EntryDiff {
    pub timestamp: String,
    pub diff: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub uploaded_at: Option<String>,
}

/// Payload of `POST`/`PATCH /projects/{id}/notebook`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveEntryRequest {
    pub id: Option<String>,
    pub content: String,
    pub structured: Option<StructuredContent>,
    pub device: Option<String>,
    pub location: Option<String>,
    pub visibility: String,
    pub session_id: String,
    pub experiment_id: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// View State
// ============================================================================

/// How the timeline buckets entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Day,
    Session,
    Experiment,
    None,
}

impl GroupBy {
    pub const ALL: [GroupBy; 4] = [
        GroupBy::Day,
        GroupBy::Session,
        GroupBy::Experiment,
        GroupBy::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Day => "day",
            GroupBy::Session => "session",
            GroupBy::Experiment => "experiment",
            GroupBy::None => "none",
        }
    }

    /// Parses a query value; unknown values yield `None`.
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == value.trim())
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupBy::Day => "By day",
            GroupBy::Session => "By session",
            GroupBy::Experiment => "By experiment",
            GroupBy::None => "No grouping",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Freeform,
    Structured,
}

impl EditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditMode::Freeform => "freeform",
            EditMode::Structured => "structured",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim() {
            "freeform" => Some(EditMode::Freeform),
            "structured" => Some(EditMode::Structured),
            _ => None,
        }
    }
}

/// How an attachment is previewed, chosen from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    Audio,
    Video,
    Link,
}

// ============================================================================
// Users & Projects
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: String,
    pub role: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Project {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectStep {
    pub id: String,
    pub title: String,
    pub results_markdown: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaperContent {
    pub content: String,
}

// ============================================================================
// AI Endpoints
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Journal {
    pub name: String,
    pub description: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalMatchRequest<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_context: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalMatchResponse {
    pub journals: Option<Vec<Journal>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CopilotRequest<'a> {
    pub message: &'a str,
    pub experiment_context: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopilotResponse {
    pub reply: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_deserializes_backend_shape() {
        let json = r#"{
            "id": "e1",
            "project_id": "p1",
            "user_id": "u1",
            "user_name": "Ada",
            "timestamp": "2024-03-01T09:30:00",
            "device": "Mozilla/5.0",
            "location": null,
            "session_id": "2024-03-01",
            "experiment_id": "p1",
            "version": null,
            "visibility": "team",
            "content": "pipetted",
            "structured": null,
            "diffs": null,
            "attachments": [{"id": "a1", "filename": "gel.png", "uploaded_at": null}]
        }"#;
        let entry: NotebookEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.user_name.as_deref(), Some("Ada"));
        assert!(entry.diffs.is_empty());
        assert_eq!(entry.attachments.len(), 1);
        assert_eq!(entry.attachments[0].filename, "gel.png");
        assert!(entry.structured.is_none());
    }

    #[test]
    fn test_entry_tolerates_missing_fields() {
        let entry: NotebookEntry = serde_json::from_str(r#"{"id": "e2"}"#).unwrap();
        assert_eq!(entry.id, "e2");
        assert!(entry.content.is_none());
        assert!(entry.attachments.is_empty());
    }

    #[test]
    fn test_structured_partial_fields() {
        let s: StructuredContent =
            serde_json::from_str(r#"{"observation": "blue", "result": "ok"}"#).unwrap();
        assert_eq!(s.observation, "blue");
        assert_eq!(s.hypothesis, "");
        assert_eq!(s.result, "ok");
    }

    #[test]
    fn test_save_request_serializes_all_keys() {
        let req = SaveEntryRequest {
            id: None,
            content: "x".to_string(),
            structured: None,
            device: Some("curl".to_string()),
            location: None,
            visibility: "team".to_string(),
            session_id: "2024-01-01".to_string(),
            experiment_id: "p1".to_string(),
        };
        let value = serde_json::to_value(&req).unwrap();
        for key in [
            "id",
            "content",
            "structured",
            "device",
            "location",
            "visibility",
            "session_id",
            "experiment_id",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert!(value["id"].is_null());
    }

    #[test]
    fn test_journal_request_omits_missing_context() {
        let legacy = JournalMatchRequest {
            content: "paper",
            experiment_context: None,
        };
        assert_eq!(
            serde_json::to_string(&legacy).unwrap(),
            r#"{"content":"paper"}"#
        );
    }

    #[test]
    fn test_group_by_round_trips_query_values() {
        for group in GroupBy::ALL {
            let parsed: GroupBy =
                serde_json::from_value(serde_json::Value::String(group.as_str().into())).unwrap();
            assert_eq!(parsed, group);
        }
    }

    #[test]
    fn test_unknown_query_values_parse_to_none() {
        assert_eq!(GroupBy::from_param("session"), Some(GroupBy::Session));
        assert_eq!(GroupBy::from_param("weekly"), None);
        assert_eq!(EditMode::from_param("structured"), Some(EditMode::Structured));
        assert_eq!(EditMode::from_param("wysiwyg"), None);
    }
}
