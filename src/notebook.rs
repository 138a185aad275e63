//! Notebook view logic: filtering, grouping, entry editing and rendering
//! helpers shared by the timeline and editor pages.

use crate::models::{
    EditMode, GroupBy, NotebookEntry, PreviewKind, SaveEntryRequest, StructuredContent,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use pulldown_cmark::{html, Options, Parser};
use std::collections::HashMap;

/// Length of the timeline snippet, in characters.
pub const SNIPPET_CHARS: usize = 80;
pub const DEFAULT_VISIBILITY: &str = "team";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov"];

// ============================================================================
// Text Escaping
// ============================================================================

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ============================================================================
// Markdown Rendering
// ============================================================================

pub fn render_markdown(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(content, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    // Raw HTML inside markdown is untrusted
    ammonia::clean(&html_output)
}

// ============================================================================
// Timestamps
// ============================================================================

/// Formats an API timestamp for display. The API emits ISO-8601 with or
/// without an offset; anything unparseable is shown as-is.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r.trim(),
        _ => return String::new(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

/// Session identifier stamped on saved entries: the current UTC date.
pub fn session_id_for(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

// ============================================================================
// Search & Grouping
// ============================================================================

fn entry_matches(entry: &NotebookEntry, needle: &str) -> bool {
    if let Some(ref content) = entry.content {
        if content.to_lowercase().contains(needle) {
            return true;
        }
    }
    entry.structured.as_ref().is_some_and(|s| {
        s.labeled_fields()
            .iter()
            .any(|(_, value)| value.to_lowercase().contains(needle))
    })
}

/// Keeps entries whose content (or structured field text) contains the
/// needle, case-insensitively. A blank needle keeps everything.
pub fn filter_entries<'a>(entries: &'a [NotebookEntry], needle: &str) -> Vec<&'a NotebookEntry> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return entries.iter().collect();
    }
    entries
        .iter()
        .filter(|e| entry_matches(e, &needle))
        .collect()
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Bucket key for an entry under the given grouping.
pub fn group_key(entry: &NotebookEntry, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Day => entry
            .timestamp
            .as_deref()
            .map(|t| t.chars().take(10).collect::<String>())
            .unwrap_or_default(),
        GroupBy::Session => non_empty(entry.session_id.as_ref())
            .unwrap_or("Session")
            .to_string(),
        GroupBy::Experiment => non_empty(entry.experiment_id.as_ref())
            .unwrap_or("Experiment")
            .to_string(),
        GroupBy::None => "All".to_string(),
    }
}

/// A timeline bucket: its label and the entries in list order.
#[derive(Debug)]
pub struct EntryGroup<'a> {
    pub key: String,
    pub entries: Vec<&'a NotebookEntry>,
}

/// Groups entries into buckets. Buckets appear in the order their key is
/// first seen, and entries keep their incoming order inside a bucket.
pub fn group_entries<'a>(entries: &[&'a NotebookEntry], group_by: GroupBy) -> Vec<EntryGroup<'a>> {
    let mut groups: Vec<EntryGroup<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for &entry in entries {
        let key = group_key(entry, group_by);
        match index.get(&key) {
            Some(&i) => groups[i].entries.push(entry),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(EntryGroup {
                    key,
                    entries: vec![entry],
                });
            }
        }
    }

    if groups.is_empty() && group_by == GroupBy::None {
        groups.push(EntryGroup {
            key: "All".to_string(),
            entries: Vec::new(),
        });
    }

    groups
}

/// First [`SNIPPET_CHARS`] characters of the content, with `...` when cut.
pub fn snippet(content: Option<&str>) -> String {
    let content = content.unwrap_or("");
    if content.chars().count() > SNIPPET_CHARS {
        let head: String = content.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

// ============================================================================
// Attachments
// ============================================================================

pub fn preview_kind(filename: &str) -> PreviewKind {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    let ext = ext.as_str();
    if IMAGE_EXTENSIONS.contains(&ext) {
        PreviewKind::Image
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        PreviewKind::Audio
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        PreviewKind::Video
    } else {
        PreviewKind::Link
    }
}

pub fn attachment_url(attachment_id: &str) -> String {
    format!(
        "/notebook-attachments/{}/download",
        urlencoding::encode(attachment_id)
    )
}

// ============================================================================
// Entry Editing
// ============================================================================

/// The editor mode an entry opens in.
pub fn mode_for_entry(entry: Option<&NotebookEntry>) -> EditMode {
    match entry {
        Some(e) if e.structured.is_some() => EditMode::Structured,
        _ => EditMode::Freeform,
    }
}

/// Markdown shown in the live preview for a structured entry.
pub fn structured_preview_markdown(fields: &StructuredContent) -> String {
    fields
        .labeled_fields()
        .iter()
        .map(|(label, value)| format!("**{}:** {}", label, value))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Plain content saved alongside a structured entry: the field values in
/// fixed order, separated by blank lines.
pub fn structured_content(fields: &StructuredContent) -> String {
    fields
        .labeled_fields()
        .iter()
        .map(|(_, value)| *value)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Markdown for the preview pane in either mode.
pub fn preview_markdown(mode: EditMode, freeform: &str, fields: &StructuredContent) -> String {
    match mode {
        EditMode::Structured => structured_preview_markdown(fields),
        EditMode::Freeform => freeform.to_string(),
    }
}

/// What the editor form submitted.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub entry_id: Option<String>,
    pub mode: EditMode,
    pub content: String,
    pub fields: StructuredContent,
    pub device: Option<String>,
    pub location: Option<String>,
}

/// Shapes the create/update payload for an editor submission.
pub fn build_save_request(
    draft: EntryDraft,
    project_id: &str,
    now: DateTime<Utc>,
) -> SaveEntryRequest {
    let (content, structured) = match draft.mode {
        EditMode::Structured => (structured_content(&draft.fields), Some(draft.fields)),
        EditMode::Freeform => (draft.content, None),
    };

    SaveEntryRequest {
        id: draft.entry_id.filter(|id| !id.is_empty()),
        content,
        structured,
        device: draft.device.filter(|d| !d.is_empty()),
        location: draft.location.filter(|l| !l.is_empty()),
        visibility: DEFAULT_VISIBILITY.to_string(),
        session_id: session_id_for(now),
        experiment_id: project_id.to_string(),
    }
}

/// Rounds a browser-reported position to the stored `lat,lon` form.
pub fn format_location(latitude: f64, longitude: f64) -> String {
    format!("{:.4},{:.4}", latitude, longitude)
}
