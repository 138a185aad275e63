//! Paper editor: draft persistence, toolbar, experiment context, and the
//! journal-matching and copilot endpoints the editor page calls.

use crate::api::NO_REPLY;
use crate::auth::{access_token, is_logged_in};
use crate::models::{NotebookEntry, ProjectStep};
use crate::notebook::render_markdown;
use crate::templates::{base_html, journal_cards, paper_link, render_paper_editor};
use crate::SharedState;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Cookie identifying this browser's paper draft
pub const DRAFT_COOKIE: &str = "labbook_draft";
pub const DEFAULT_DRAFT: &str = "## Start writing your paper here...\n";

const DRAFTS_TREE: &str = "paper_drafts";
const DRAFT_ID_LEN: usize = 24;

// ============================================================================
// Draft Storage
// ============================================================================

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft store: {0}")]
    Store(#[from] sled::Error),
    #[error("draft is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Per-browser paper drafts. One value per draft id, overwritten on every
/// save; there is no history.
#[derive(Clone)]
pub struct DraftStore {
    tree: sled::Tree,
}

impl DraftStore {
    pub fn open(path: &Path) -> Result<Self, DraftError> {
        let db = sled::open(path)?;
        Ok(Self {
            tree: db.open_tree(DRAFTS_TREE)?,
        })
    }

    pub fn load(&self, draft_id: &str) -> Result<Option<String>, DraftError> {
        match self.tree.get(draft_id.as_bytes())? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes.to_vec())?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, draft_id: &str, content: &str) -> Result<(), DraftError> {
        self.tree.insert(draft_id.as_bytes(), content.as_bytes())?;
        Ok(())
    }
}

pub fn new_draft_id() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(DRAFT_ID_LEN)
        .map(char::from)
        .collect()
}

fn valid_draft_id(id: &str) -> bool {
    id.len() == DRAFT_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// The browser's draft id, if it carries a well-formed one.
pub fn draft_id(jar: &CookieJar) -> Option<String> {
    jar.get(DRAFT_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|id| valid_draft_id(id))
}

fn draft_cookie(id: String) -> Cookie<'static> {
    Cookie::build((DRAFT_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .permanent()
        .build()
}

fn load_draft_or_default(state: &SharedState, id: &str) -> String {
    match state.drafts.load(id) {
        Ok(Some(content)) => content,
        Ok(None) => DEFAULT_DRAFT.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "could not load paper draft");
            DEFAULT_DRAFT.to_string()
        }
    }
}

// ============================================================================
// Toolbar
// ============================================================================

/// A markdown toolbar button: the text it inserts at the cursor and the
/// character range selected afterwards, relative to the insertion point.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolbarAction {
    pub icon: &'static str,
    pub title: &'static str,
    pub insert: &'static str,
    pub select: (usize, usize),
}

pub const TOOLBAR: &[ToolbarAction] = &[
    ToolbarAction { icon: "<b>B</b>", title: "Bold", insert: "**bold**", select: (2, 6) },
    ToolbarAction { icon: "<i>I</i>", title: "Italic", insert: "*italic*", select: (1, 7) },
    ToolbarAction { icon: "H1", title: "Heading 1", insert: "# Heading 1", select: (2, 10) },
    ToolbarAction { icon: "H2", title: "Heading 2", insert: "## Heading 2", select: (3, 11) },
    ToolbarAction { icon: "&bull;", title: "Bulleted List", insert: "- List item", select: (2, 11) },
    ToolbarAction { icon: "1.", title: "Numbered List", insert: "1. List item", select: (3, 12) },
    ToolbarAction { icon: "Link", title: "Link", insert: "[text](url)", select: (1, 5) },
    ToolbarAction { icon: "Img", title: "Image", insert: "![alt](url)", select: (2, 5) },
];

// ============================================================================
// Experiment Context
// ============================================================================

/// Everything the assistant endpoints are told about the experiment.
#[derive(Debug, Clone, Default)]
pub struct ExperimentContext {
    pub title: String,
    pub notebook: Vec<String>,
    pub steps: Vec<String>,
    pub results: Vec<String>,
}

impl ExperimentContext {
    pub fn from_parts(title: &str, entries: &[NotebookEntry], steps: &[ProjectStep]) -> Self {
        Self {
            title: title.to_string(),
            notebook: entries
                .iter()
                .map(|e| e.content.clone().unwrap_or_default())
                .collect(),
            steps: steps.iter().map(|s| s.title.clone()).collect(),
            results: steps
                .iter()
                .filter_map(|s| s.results_markdown.clone())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    pub fn render(&self) -> String {
        fn bullets(items: &[String]) -> String {
            items
                .iter()
                .map(|i| format!("- {}", i))
                .collect::<Vec<_>>()
                .join("\n")
        }
        format!(
            "Experiment Title: {}\n\nLab Notebook Entries:\n{}\n\nExperiment Steps:\n{}\n\nStep Results:\n{}",
            self.title,
            bullets(&self.notebook),
            bullets(&self.steps),
            bullets(&self.results)
        )
    }
}

pub fn experiment_context(title: &str, entries: &[NotebookEntry], steps: &[ProjectStep]) -> String {
    ExperimentContext::from_parts(title, entries, steps).render()
}

/// Fetch the project's title, notebook and steps. Any part that fails to
/// load is left empty.
pub async fn gather_context(state: &SharedState, token: &str, project_id: Option<&str>) -> String {
    let project_id = match project_id.filter(|p| !p.is_empty()) {
        Some(p) => p,
        None => return ExperimentContext::default().render(),
    };

    let (project, entries, steps) = tokio::join!(
        state.api.get_project(token, project_id),
        state.api.list_entries(token, project_id),
        state.api.project_steps(token, project_id),
    );

    let title = project.map(|p| p.title).unwrap_or_else(|e| {
        tracing::warn!(error = %e, project_id, "project lookup failed");
        String::new()
    });
    let entries = entries.unwrap_or_else(|e| {
        tracing::warn!(error = %e, project_id, "notebook lookup failed");
        Vec::new()
    });
    let steps = steps.unwrap_or_else(|e| {
        tracing::warn!(error = %e, project_id, "steps lookup failed");
        Vec::new()
    });

    experiment_context(&title, &entries, &steps)
}

// ============================================================================
// Rendering
// ============================================================================

/// A standalone, print-styled document for the preview frame and PDF export.
pub fn print_document(markdown: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>paper</title>
    <style>
        body {{ font-family: Georgia, Times, serif; padding: 2em; color: #222; }}
        @page {{ margin: 0.5in; }}
        @media print {{ .print-hint {{ display: none; }} }}
    </style>
</head>
<body>
{}
</body>
</html>"#,
        render_markdown(markdown)
    )
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize, Default)]
pub struct PaperQuery {
    pub project_id: Option<String>,
}

pub async fn paper_page(
    Query(query): Query<PaperQuery>,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Response {
    let logged_in = is_logged_in(&jar);
    let (jar, id) = match draft_id(&jar) {
        Some(id) => (jar, id),
        None => {
            let id = new_draft_id();
            (jar.add(draft_cookie(id.clone())), id)
        }
    };

    let draft = load_draft_or_default(&state, &id);
    let project_id = query.project_id.filter(|p| !p.is_empty());
    let html = render_paper_editor(&draft, project_id.as_deref(), logged_in);

    (jar, Html(html)).into_response()
}

#[derive(Deserialize)]
pub struct DraftBody {
    pub content: String,
}

pub async fn save_draft(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(body): Json<DraftBody>,
) -> Response {
    let id = match draft_id(&jar) {
        Some(id) => id,
        None => return (StatusCode::BAD_REQUEST, "No draft cookie").into_response(),
    };

    match state.drafts.save(&id, &body.content) {
        Ok(()) => (StatusCode::OK, "Saved").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "could not save paper draft");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save draft").into_response()
        }
    }
}

pub async fn preview(Json(body): Json<DraftBody>) -> Html<String> {
    Html(print_document(&body.content))
}

#[derive(Deserialize)]
pub struct PrintForm {
    #[serde(default)]
    pub content: String,
}

/// Print-ready copy of the editor's current text; the browser's print
/// dialog turns it into `paper.pdf`. The submitted text also becomes the
/// stored draft.
pub async fn print_paper(
    State(state): State<SharedState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<PrintForm>,
) -> Response {
    if let Some(id) = draft_id(&jar) {
        if let Err(e) = state.drafts.save(&id, &form.content) {
            tracing::warn!(error = %e, "could not save paper draft");
        }
    }
    let document = print_document(&form.content).replace(
        "</body>",
        "<script>window.addEventListener('load', () => window.print());</script>\n</body>",
    );
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"paper.html\""),
        ],
        document,
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct JournalMatchBody {
    pub content: String,
    pub project_id: Option<String>,
}

#[derive(Serialize)]
pub struct JournalMatchReply {
    pub journals: Vec<crate::models::Journal>,
}

pub async fn journal_match(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(body): Json<JournalMatchBody>,
) -> Json<JournalMatchReply> {
    let token = match access_token(&jar) {
        Some(t) => t,
        None => return Json(JournalMatchReply { journals: Vec::new() }),
    };
    let context = gather_context(&state, &token, body.project_id.as_deref()).await;
    let journals = state.api.journal_match(&token, &body.content, &context).await;
    tracing::info!(count = journals.len(), "journal match");
    Json(JournalMatchReply { journals })
}

#[derive(Deserialize)]
pub struct CopilotBody {
    pub message: String,
    pub project_id: Option<String>,
}

#[derive(Serialize)]
pub struct CopilotReply {
    pub reply: String,
}

pub async fn copilot_chat(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(body): Json<CopilotBody>,
) -> Response {
    let message = body.message.trim();
    if message.is_empty() {
        return (StatusCode::BAD_REQUEST, "Empty message").into_response();
    }

    let token = match access_token(&jar) {
        Some(t) => t,
        None => {
            return Json(CopilotReply {
                reply: NO_REPLY.to_string(),
            })
            .into_response()
        }
    };
    let project_id = body.project_id.as_deref();
    let context = gather_context(&state, &token, project_id).await;
    let reply = match state
        .api
        .copilot_chat(&token, message, &context, project_id)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, "copilot chat failed");
            NO_REPLY.to_string()
        }
    };

    Json(CopilotReply { reply }).into_response()
}

#[derive(Deserialize)]
pub struct ProjectPaperForm {
    pub project_id: String,
}

/// Replace the local draft with the paper stored on the project.
pub async fn load_from_project(
    State(state): State<SharedState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<ProjectPaperForm>,
) -> Response {
    let back = format!("/paper?project_id={}", urlencoding::encode(&form.project_id));
    let (token, id) = match (access_token(&jar), draft_id(&jar)) {
        (Some(t), Some(id)) => (t, id),
        _ => return Redirect::to(&back).into_response(),
    };

    match state.api.load_project_paper(&token, &form.project_id).await {
        Ok(content) => {
            if let Err(e) = state.drafts.save(&id, &content) {
                tracing::warn!(error = %e, "could not store project paper locally");
            }
        }
        Err(e) => tracing::warn!(error = %e, project_id = %form.project_id, "project paper load failed"),
    }

    Redirect::to(&back).into_response()
}

/// Push the local draft to the project.
pub async fn save_to_project(
    State(state): State<SharedState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<ProjectPaperForm>,
) -> Response {
    let back = format!("/paper?project_id={}", urlencoding::encode(&form.project_id));
    let (token, id) = match (access_token(&jar), draft_id(&jar)) {
        (Some(t), Some(id)) => (t, id),
        _ => return Redirect::to(&back).into_response(),
    };

    let draft = load_draft_or_default(&state, &id);
    match state
        .api
        .save_project_paper(&token, &form.project_id, &draft)
        .await
    {
        Ok(()) => {
            tracing::info!(project_id = %form.project_id, "paper saved to project");
            Redirect::to(&format!("{}&saved=1", back)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, project_id = %form.project_id, "project paper save failed");
            Redirect::to(&back).into_response()
        }
    }
}

/// Standalone page listing the journal suggestions, for browsers without
/// script support.
pub async fn journal_page(
    State(state): State<SharedState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<JournalMatchBody>,
) -> Html<String> {
    let logged_in = is_logged_in(&jar);
    let journals = match access_token(&jar) {
        Some(token) => {
            let context = gather_context(&state, &token, form.project_id.as_deref()).await;
            state.api.journal_match(&token, &form.content, &context).await
        }
        None => Vec::new(),
    };

    let mut html = String::from("<h1>Journal Matches</h1>");
    html.push_str(&journal_cards(&journals));
    if journals.is_empty() {
        html.push_str("<p class=\"muted\">No journals suggested.</p>");
    }
    html.push_str(&format!(
        "<p><a href=\"{}\">&larr; Back to editor</a></p>",
        paper_link(form.project_id.as_deref())
    ));

    Html(base_html("Journal Matches", &html, logged_in))
}
