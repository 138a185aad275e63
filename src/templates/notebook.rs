//! Notebook page: timeline column and entry editor.

use crate::models::{
    Attachment, EditMode, EntryDiff, GroupBy, NotebookEntry, PreviewKind, StructuredContent,
};
use crate::notebook::{
    attachment_url, format_timestamp, html_escape, preview_kind, preview_markdown,
    render_markdown, snippet, EntryGroup, DEFAULT_VISIBILITY,
};

use super::components::{page_html, toast};

/// Everything the notebook page shows for one request.
pub struct NotebookView<'a> {
    pub project_id: &'a str,
    pub groups: &'a [EntryGroup<'a>],
    pub group_by: GroupBy,
    pub search: &'a str,
    pub current: Option<&'a NotebookEntry>,
    pub mode: EditMode,
    pub saved: bool,
    pub logged_in: bool,
    /// Display name of the signed-in user, shown in the nav bar.
    pub user: Option<&'a str>,
}

fn notebook_link(project_id: &str, params: &[(&str, &str)]) -> String {
    let mut link = format!("/notebook?project_id={}", urlencoding::encode(project_id));
    for (key, value) in params {
        if !value.is_empty() {
            link.push_str(&format!("&{}={}", key, urlencoding::encode(value)));
        }
    }
    html_escape(&link)
}

// ============================================================================
// Timeline
// ============================================================================

fn render_entry_card(entry: &NotebookEntry, view: &NotebookView) -> String {
    let current = view.current.map(|c| c.id == entry.id).unwrap_or(false);
    let clips = entry
        .attachments
        .iter()
        .map(|a| format!("<span>📎 {}</span>", html_escape(&a.filename)))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"<a class="entry-card{current}" href="{href}">
            <div>
                <span class="author">{author}</span>
                <span class="meta">{time}</span>
                <span class="meta">{device}</span>
                <span class="meta">{location}</span>
            </div>
            <div class="snippet">{snippet}</div>
            <div class="clips">{clips}</div>
        </a>"#,
        current = if current { " current" } else { "" },
        href = notebook_link(
            view.project_id,
            &[
                ("entry", entry.id.as_str()),
                ("group", view.group_by.as_str()),
                ("q", view.search),
            ]
        ),
        author = html_escape(entry.user_name.as_deref().unwrap_or("Unknown")),
        time = html_escape(&format_timestamp(entry.timestamp.as_deref())),
        device = html_escape(entry.device.as_deref().unwrap_or("")),
        location = html_escape(entry.location.as_deref().unwrap_or("")),
        snippet = html_escape(&snippet(entry.content.as_deref())),
        clips = clips,
    )
}

pub fn render_timeline(view: &NotebookView) -> String {
    let mut html = String::from(r#"<div id="notebook-timeline">"#);
    for group in view.groups {
        html.push_str(&format!(
            r#"<div class="timeline-group"><div class="timeline-group-key">{}</div>"#,
            html_escape(&group.key)
        ));
        for entry in &group.entries {
            html.push_str(&render_entry_card(entry, view));
        }
        html.push_str("</div>");
    }
    if view.groups.iter().all(|g| g.entries.is_empty()) {
        html.push_str(r#"<p class="muted">No entries.</p>"#);
    }
    html.push_str("</div>");
    html
}

fn render_timeline_controls(view: &NotebookView) -> String {
    let options = GroupBy::ALL
        .iter()
        .map(|g| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                g.as_str(),
                if *g == view.group_by { " selected" } else { "" },
                g.label()
            )
        })
        .collect::<String>();

    format!(
        r#"<form class="timeline-controls" method="get" action="/notebook">
            <input type="hidden" name="project_id" value="{project}">
            <select id="notebook-group-toggle" name="group" onchange="this.form.submit()">{options}</select>
            <input type="text" id="notebook-search" name="q" placeholder="Search entries..." value="{search}">
            <button class="btn secondary" type="submit">Filter</button>
        </form>
        <form class="timeline-controls" method="get" action="/notebook/summary">
            <input type="hidden" name="project_id" value="{project}">
            <select id="notebook-style-toggle" name="style">
                <option value="verbose">Verbose</option>
                <option value="concise">Concise</option>
                <option value="bullet points">Bullet points</option>
            </select>
            <button class="btn secondary" type="submit">AI Summary</button>
        </form>"#,
        project = html_escape(view.project_id),
        options = options,
        search = html_escape(view.search),
    )
}

// ============================================================================
// Entry Editor
// ============================================================================

pub fn render_entry_meta(entry: &NotebookEntry) -> String {
    let field = |label: &str, value: Option<&str>| {
        format!(
            "<span>{}: <b>{}</b></span>",
            label,
            html_escape(value.unwrap_or(""))
        )
    };
    let time = format_timestamp(entry.timestamp.as_deref());

    [
        field("By", Some(entry.user_name.as_deref().unwrap_or("Unknown"))),
        field("Time", Some(time.as_str())),
        field("Device", entry.device.as_deref()),
        field("Location", entry.location.as_deref()),
        field("Session", entry.session_id.as_deref()),
        field("Experiment", entry.experiment_id.as_deref()),
        field("Version", entry.version.as_deref()),
        field(
            "Visibility",
            Some(entry.visibility.as_deref().unwrap_or(DEFAULT_VISIBILITY)),
        ),
    ]
    .join("\n")
}

pub fn render_attachment(attachment: &Attachment) -> String {
    let url = html_escape(&attachment_url(&attachment.id));
    let name = html_escape(&attachment.filename);
    let preview = match preview_kind(&attachment.filename) {
        PreviewKind::Image => format!(r#"<img src="{}" alt="{}">"#, url, name),
        PreviewKind::Audio => format!(r#"<audio controls src="{}"></audio>"#, url),
        PreviewKind::Video => format!(r#"<video controls src="{}"></video>"#, url),
        PreviewKind::Link => format!(r#"<a href="{}" target="_blank">{}</a>"#, url, name),
    };
    format!(r#"<div class="attachment">{}</div>"#, preview)
}

pub fn render_attachments(attachments: &[Attachment]) -> String {
    attachments.iter().map(render_attachment).collect()
}

/// Edit history, or nothing when the entry was never changed.
pub fn render_diffs(diffs: &[EntryDiff]) -> String {
    if diffs.is_empty() {
        return String::new();
    }
    let mut html = String::from(r#"<div id="notebook-diff-view" class="diff-view"><h3>History</h3>"#);
    for d in diffs {
        html.push_str(&format!(
            "<div><b>{}</b><pre>{}</pre></div>",
            html_escape(&d.timestamp),
            html_escape(&d.diff)
        ));
    }
    html.push_str("</div>");
    html
}

fn structured_textarea(id: &str, name: &str, label: &str, value: &str) -> String {
    format!(
        r#"<label for="{id}">{label}</label>
        <textarea id="{id}" name="{name}" rows="2" oninput="updatePreview()">{value}</textarea>"#,
        id = id,
        name = name,
        label = label,
        value = html_escape(value)
    )
}

fn render_editor(view: &NotebookView) -> String {
    let entry = view.current;
    let entry_id = entry.map(|e| e.id.as_str()).unwrap_or("");
    let fields = entry
        .and_then(|e| e.structured.clone())
        .unwrap_or_default();
    let freeform = match entry {
        Some(e) if e.structured.is_none() => e.content.clone().unwrap_or_default(),
        _ => String::new(),
    };
    let structured = view.mode == EditMode::Structured;

    let mode_link = |mode: EditMode| {
        notebook_link(
            view.project_id,
            &[
                ("entry", entry_id),
                ("mode", mode.as_str()),
                ("group", view.group_by.as_str()),
                ("q", view.search),
            ],
        )
    };

    let meta = entry.map(render_entry_meta).unwrap_or_default();
    let preview = render_markdown(&preview_markdown(view.mode, &freeform, &fields));
    let attachments = entry
        .map(|e| render_attachments(&e.attachments))
        .unwrap_or_default();
    let diffs = entry.map(|e| render_diffs(&e.diffs)).unwrap_or_default();

    let upload_form = if entry.is_some() {
        format!(
            r#"<form method="post" action="/notebook/attachments" enctype="multipart/form-data" class="editor-toolbar">
                <input type="hidden" name="project_id" value="{project}">
                <input type="hidden" name="entry_id" value="{entry}">
                <input type="file" id="notebook-attach" name="file" multiple>
                <button class="btn secondary" type="submit" id="attach-btn">Attach</button>
            </form>"#,
            project = html_escape(view.project_id),
            entry = html_escape(entry_id),
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class="editor-toolbar">
            <a class="btn {freeform_active}" id="mode-freeform" href="{freeform_link}">Freeform</a>
            <a class="btn {structured_active}" id="mode-structured" href="{structured_link}">Structured</a>
            <span class="spacer"></span>
            <a class="btn secondary" id="new-entry-btn" href="{new_link}">New Entry</a>
            <button class="btn secondary" type="button" id="voice-btn" onclick="alert('Voice dictation coming soon!')">Voice</button>
            <button class="btn secondary" type="button" id="ocr-btn" onclick="alert('OCR image-to-text coming soon!')">OCR</button>
        </div>
        <div class="entry-meta" id="notebook-entry-meta">{meta}</div>
        <form method="post" action="/notebook/save" id="notebook-form">
            <input type="hidden" name="project_id" value="{project}">
            <input type="hidden" name="entry_id" value="{entry_id}">
            <input type="hidden" name="mode" value="{mode}">
            <input type="hidden" name="location" id="notebook-location" value="">
            <textarea id="notebook-editor" name="content" rows="12" class="{freeform_hidden}" oninput="updatePreview()">{freeform}</textarea>
            <div id="notebook-structured-fields" class="structured-fields {structured_hidden}">
                {obs}{hyp}{method}{result}{conc}
            </div>
            <div class="editor-toolbar" style="margin-top: 0.75rem">
                <button class="btn" type="submit" id="save-entry-btn">Save Entry</button>
            </div>
        </form>
        {upload_form}
        <div class="attachments" id="notebook-attachments">{attachments}</div>
        <h3>Preview</h3>
        <div class="preview" id="notebook-preview">{preview}</div>
        {diffs}"#,
        freeform_active = if structured { "secondary" } else { "active" },
        structured_active = if structured { "active" } else { "secondary" },
        freeform_link = mode_link(EditMode::Freeform),
        structured_link = mode_link(EditMode::Structured),
        new_link = notebook_link(
            view.project_id,
            &[("group", view.group_by.as_str()), ("q", view.search)]
        ),
        meta = meta,
        project = html_escape(view.project_id),
        entry_id = html_escape(entry_id),
        mode = view.mode.as_str(),
        freeform_hidden = if structured { "hidden" } else { "" },
        freeform = html_escape(&freeform),
        structured_hidden = if structured { "" } else { "hidden" },
        obs = structured_textarea("notebook-obs", "observation", "Observation", &fields.observation),
        hyp = structured_textarea("notebook-hyp", "hypothesis", "Hypothesis", &fields.hypothesis),
        method = structured_textarea("notebook-method", "method", "Method", &fields.method),
        result = structured_textarea("notebook-result", "result", "Result", &fields.result),
        conc = structured_textarea("notebook-conc", "conclusion", "Conclusion", &fields.conclusion),
        upload_form = upload_form,
        attachments = attachments,
        preview = preview,
        diffs = diffs,
    )
}

const NOTEBOOK_SCRIPT: &str = r#"<script>
    let previewTimer = null;

    function collectFields() {
        const mode = document.querySelector('#notebook-form input[name=mode]').value;
        const value = id => document.getElementById(id).value;
        return {
            mode: mode,
            content: value('notebook-editor'),
            observation: value('notebook-obs'),
            hypothesis: value('notebook-hyp'),
            method: value('notebook-method'),
            result: value('notebook-result'),
            conclusion: value('notebook-conc')
        };
    }

    function updatePreview() {
        clearTimeout(previewTimer);
        previewTimer = setTimeout(async () => {
            const res = await fetch('/api/notebook/preview', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(collectFields())
            });
            if (res.ok) {
                document.getElementById('notebook-preview').innerHTML = await res.text();
            }
        }, 250);
    }

    if (navigator.geolocation) {
        navigator.geolocation.getCurrentPosition(pos => {
            document.getElementById('notebook-location').value =
                pos.coords.latitude.toFixed(4) + ',' + pos.coords.longitude.toFixed(4);
        });
    }
</script>"#;

pub fn render_notebook_page(view: &NotebookView) -> String {
    let content = format!(
        r#"<div class="notebook-layout">
            <section>
                <h2>Timeline</h2>
                {controls}
                {timeline}
            </section>
            <section>
                <h2>{heading}</h2>
                {editor}
            </section>
        </div>
        {toast}"#,
        controls = render_timeline_controls(view),
        timeline = render_timeline(view),
        heading = if view.current.is_some() { "Edit Entry" } else { "New Entry" },
        editor = render_editor(view),
        toast = if view.saved { toast("Saved") } else { String::new() },
    );

    page_html(
        "Lab Notebook",
        &content,
        Some(view.project_id),
        view.logged_in,
        view.user,
        NOTEBOOK_SCRIPT,
    )
}

/// Rendered preview for the form fields the editor script posts.
pub fn render_preview(mode: EditMode, content: &str, fields: &StructuredContent) -> String {
    render_markdown(&preview_markdown(mode, content, fields))
}
