//! Paper editor template: markdown toolbar, live preview frame, journal
//! suggestions, and the draggable copilot window.

use crate::models::Journal;
use crate::notebook::html_escape;
use crate::paper::TOOLBAR;

use super::components::{page_html, project_query};

/// JSON literal safe to drop inside a `<script>` element.
fn script_json<T: serde::Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value)
        .map(|json| json.replace("</", "<\\/"))
        .unwrap_or_else(|_| fallback.to_string())
}

// ============================================================================
// Journal Cards
// ============================================================================

/// Only web links are clickable; any other scheme is shown as text.
fn is_web_url(raw: &str) -> bool {
    url::Url::parse(raw.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub fn journal_card(journal: &Journal) -> String {
    let body = format!(
        r#"<div class="name">{name}</div>
            <div class="description">{description}</div>
            <div class="url">{url_text}</div>"#,
        name = html_escape(&journal.name),
        description = html_escape(journal.description.as_deref().unwrap_or("")),
        url_text = html_escape(&journal.url),
    );
    if is_web_url(&journal.url) {
        format!(
            r#"<a class="journal-card" href="{}" target="_blank" rel="noopener">{}</a>"#,
            html_escape(journal.url.trim()),
            body
        )
    } else {
        format!(r#"<div class="journal-card">{}</div>"#, body)
    }
}

pub fn journal_cards(journals: &[Journal]) -> String {
    let cards: String = journals.iter().map(journal_card).collect();
    format!(r#"<div class="journal-matches" id="journal-matches">{}</div>"#, cards)
}

// ============================================================================
// Editor Page
// ============================================================================

fn render_toolbar() -> String {
    TOOLBAR
        .iter()
        .enumerate()
        .map(|(i, action)| {
            format!(
                r#"<button class="btn secondary" type="button" title="{title}" onclick="applyToolbar({i})">{icon}</button>"#,
                title = html_escape(action.title),
                i = i,
                icon = action.icon,
            )
        })
        .collect()
}

fn render_project_forms(project_id: Option<&str>, logged_in: bool) -> String {
    let project_id = match project_id {
        Some(p) if logged_in => p,
        _ => return String::new(),
    };
    format!(
        r#"<form method="post" action="/paper/load" style="display:inline">
            <input type="hidden" name="project_id" value="{project}">
            <button class="btn secondary" type="submit">Load from Project</button>
        </form>
        <form method="post" action="/paper/save" style="display:inline">
            <input type="hidden" name="project_id" value="{project}">
            <button class="btn secondary" type="submit">Save to Project</button>
        </form>"#,
        project = html_escape(project_id)
    )
}

const COPILOT_MODAL: &str = r#"<div id="copilot-modal" class="hidden">
    <div id="copilot-modal-header">
        <h3>Copilot</h3>
        <button class="btn secondary" type="button" id="close-copilot-modal">&times;</button>
    </div>
    <div id="copilot-chat-window"></div>
    <form id="copilot-chat-form">
        <input type="text" id="copilot-chat-input" placeholder="Ask about your paper..." autocomplete="off">
        <button class="btn" type="submit">Send</button>
    </form>
</div>"#;

pub fn render_paper_editor(draft: &str, project_id: Option<&str>, logged_in: bool) -> String {
    let content = format!(
        r#"<h1>Paper Editor</h1>
        <div class="editor-toolbar" id="paper-toolbar">
            {toolbar}
            <span class="spacer"></span>
            <button class="btn" type="button" id="journal-match-btn">Match Journals</button>
            <button class="btn" type="button" id="open-copilot-btn">Copilot</button>
            <button class="btn secondary" type="submit" id="download-pdf-btn" form="paper-form" formaction="/paper/print" formmethod="post" formtarget="_blank">Download PDF</button>
            {project_forms}
        </div>
        <div class="paper-layout">
            <form method="post" action="/paper/journals" id="paper-form">
                <input type="hidden" name="project_id" value="{project}">
                <textarea id="paper-editor" name="content" spellcheck="true">{draft}</textarea>
                <noscript><button class="btn" type="submit">Match Journals</button></noscript>
            </form>
            <iframe id="pdf-preview" title="Preview"></iframe>
        </div>
        <div id="journal-status" class="muted"></div>
        <div class="journal-matches" id="journal-matches"></div>
        {modal}"#,
        toolbar = render_toolbar(),
        project_forms = render_project_forms(project_id, logged_in),
        project = html_escape(project_id.unwrap_or("")),
        draft = html_escape(draft),
        modal = COPILOT_MODAL,
    );

    let scripts = format!(
        r#"<script>
    const TOOLBAR = {toolbar_json};
    const PROJECT_ID = {project_json};
    const editor = document.getElementById('paper-editor');
    const frame = document.getElementById('pdf-preview');
    let saveTimer = null;

    function escapeHtml(text) {{
        const div = document.createElement('div');
        div.textContent = text;
        return div.innerHTML;
    }}

    async function refreshPreview() {{
        const res = await fetch('/api/paper/preview', {{
            method: 'POST',
            headers: {{ 'Content-Type': 'application/json' }},
            body: JSON.stringify({{ content: editor.value }})
        }});
        if (res.ok) {{
            frame.srcdoc = await res.text();
        }}
    }}

    function scheduleSave() {{
        clearTimeout(saveTimer);
        saveTimer = setTimeout(() => {{
            fetch('/api/paper/draft', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ content: editor.value }})
            }});
            refreshPreview();
        }}, 400);
    }}

    function applyToolbar(index) {{
        const action = TOOLBAR[index];
        const pos = editor.selectionEnd;
        editor.value = editor.value.slice(0, pos) + action.insert + editor.value.slice(pos);
        editor.focus();
        editor.setSelectionRange(pos + action.select[0], pos + action.select[1]);
        scheduleSave();
    }}

    editor.addEventListener('input', scheduleSave);
    refreshPreview();

    // Journal matching
    document.getElementById('journal-match-btn').addEventListener('click', async () => {{
        const status = document.getElementById('journal-status');
        const target = document.getElementById('journal-matches');
        status.textContent = 'Matching journals...';
        target.innerHTML = '';
        const res = await fetch('/api/journal-match', {{
            method: 'POST',
            headers: {{ 'Content-Type': 'application/json' }},
            body: JSON.stringify({{ content: editor.value, project_id: PROJECT_ID }})
        }});
        const data = res.ok ? await res.json() : {{ journals: [] }};
        status.textContent = data.journals.length ? '' : 'No journals suggested.';
        for (const j of data.journals) {{
            const linked = /^https?:\/\//i.test((j.url || '').trim());
            const card = document.createElement(linked ? 'a' : 'div');
            card.className = 'journal-card';
            if (linked) {{
                card.href = j.url.trim();
                card.target = '_blank';
                card.rel = 'noopener';
            }}
            card.innerHTML = '<div class="name">' + escapeHtml(j.name) + '</div>'
                + '<div class="description">' + escapeHtml(j.description || '') + '</div>'
                + '<div class="url">' + escapeHtml(j.url) + '</div>';
            target.appendChild(card);
        }}
    }});

    // Copilot window
    const modal = document.getElementById('copilot-modal');
    const header = document.getElementById('copilot-modal-header');
    const chat = document.getElementById('copilot-chat-window');
    const input = document.getElementById('copilot-chat-input');

    function addMessage(who, text) {{
        const row = document.createElement('div');
        row.className = 'chat-msg ' + who;
        const bubble = document.createElement('span');
        bubble.textContent = text;
        row.appendChild(bubble);
        chat.appendChild(row);
        chat.scrollTop = chat.scrollHeight;
    }}

    document.getElementById('open-copilot-btn').addEventListener('click', () => {{
        modal.classList.remove('hidden');
        input.focus();
    }});
    document.getElementById('close-copilot-modal').addEventListener('click', () => {{
        modal.classList.add('hidden');
    }});

    document.getElementById('copilot-chat-form').addEventListener('submit', async (e) => {{
        e.preventDefault();
        const message = input.value.trim();
        if (!message) return;
        input.value = '';
        addMessage('user', message);
        try {{
            const res = await fetch('/api/copilot-chat', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ message: message, project_id: PROJECT_ID }})
            }});
            const data = res.ok ? await res.json() : {{ reply: '[No response]' }};
            addMessage('copilot', data.reply || '[No response]');
        }} catch (err) {{
            addMessage('copilot', '[No response]');
        }}
    }});

    let drag = null;
    header.addEventListener('mousedown', (e) => {{
        if (e.target.tagName === 'BUTTON') return;
        const rect = modal.getBoundingClientRect();
        drag = {{ dx: e.clientX - rect.left, dy: e.clientY - rect.top }};
        document.body.classList.add('noselect');
    }});
    document.addEventListener('mousemove', (e) => {{
        if (!drag) return;
        const maxLeft = window.innerWidth - modal.offsetWidth;
        const maxTop = window.innerHeight - modal.offsetHeight;
        const left = Math.min(Math.max(0, e.clientX - drag.dx), Math.max(0, maxLeft));
        const top = Math.min(Math.max(0, e.clientY - drag.dy), Math.max(0, maxTop));
        modal.style.left = left + 'px';
        modal.style.top = top + 'px';
    }});
    document.addEventListener('mouseup', () => {{
        drag = null;
        document.body.classList.remove('noselect');
    }});
</script>"#,
        toolbar_json = script_json(TOOLBAR, "[]"),
        project_json = script_json(&project_id, "null"),
    );

    page_html("Paper Editor", &content, project_id, logged_in, None, &scripts)
}

/// Link back to the editor, keeping the project.
pub fn paper_link(project_id: Option<&str>) -> String {
    format!("/paper{}", project_query(project_id))
}
