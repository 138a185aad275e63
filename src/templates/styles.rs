//! CSS for the notebook and paper editor pages.

pub const STYLE: &str = r#"
/* Solarized Light Theme */
:root {
    --base01: #586e75;
    --base00: #657b83;
    --base1: #93a1a1;
    --base2: #eee8d5;
    --base3: #fdf6e3;

    --yellow: #b58900;
    --red: #dc322f;
    --blue: #268bd2;
    --cyan: #2aa198;
    --green: #859900;

    --bg: var(--base3);
    --fg: var(--base00);
    --muted: var(--base1);
    --border: var(--base2);
    --link: var(--blue);
    --link-hover: var(--cyan);
    --accent: var(--base2);
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    line-height: 1.6;
    color: var(--fg);
    background: var(--bg);
}

.container {
    max-width: 1200px;
    margin: 0 auto;
    padding: 1rem;
}

a { color: var(--link); text-decoration: none; }
a:hover { color: var(--link-hover); text-decoration: underline; }

h1, h2, h3 { font-weight: 600; margin-top: 1em; margin-bottom: 0.5em; }
h1 { font-size: 1.5rem; }
h2 { font-size: 1.2rem; }

.muted { color: var(--muted); }
.hidden { display: none !important; }

.nav-bar {
    position: sticky;
    top: 0;
    background: var(--bg);
    border-bottom: 1px solid var(--border);
    padding: 0.5rem 1rem;
    display: flex;
    gap: 1rem;
    align-items: center;
    flex-wrap: wrap;
    z-index: 100;
}
.nav-bar a { font-size: 0.9rem; }
.nav-bar .spacer { flex: 1; }
.nav-bar .user { font-size: 0.85rem; color: var(--base01); }

.btn {
    padding: 0.4rem 0.9rem;
    border: 1px solid var(--base1);
    border-radius: 4px;
    background: var(--blue);
    color: var(--base3);
    cursor: pointer;
    font-size: 0.85rem;
    font-family: inherit;
}
.btn:hover { background: var(--cyan); border-color: var(--cyan); }
.btn.secondary { background: var(--base2); color: var(--base00); border-color: var(--base1); }
.btn.secondary:hover { background: var(--base3); }
.btn.active { background: var(--base01); color: var(--base3); }

input[type=text], input[type=email], input[type=password], select, textarea {
    padding: 0.4rem 0.6rem;
    border: 1px solid var(--base1);
    border-radius: 4px;
    background: var(--bg);
    color: var(--fg);
    font-family: inherit;
    font-size: 0.9rem;
}
textarea { width: 100%; resize: vertical; }

.message { padding: 0.75rem 1rem; border-radius: 4px; margin: 1rem 0; background: var(--accent); }
.message.error { border-left: 3px solid var(--red); }

.toast {
    position: fixed;
    bottom: 1.5rem;
    right: 1.5rem;
    background: var(--green);
    color: var(--base3);
    padding: 0.5rem 1rem;
    border-radius: 4px;
    animation: toast-fade 1.2s forwards;
}
@keyframes toast-fade { 0%, 70% { opacity: 1; } 100% { opacity: 0; visibility: hidden; } }

/* Notebook */
.notebook-layout {
    display: grid;
    grid-template-columns: minmax(260px, 1fr) 2fr;
    gap: 1.5rem;
}
@media (max-width: 800px) { .notebook-layout { grid-template-columns: 1fr; } }

.timeline-controls { display: flex; gap: 0.5rem; flex-wrap: wrap; margin-bottom: 1rem; }
.timeline-controls input[type=text] { flex: 1; min-width: 120px; }

.timeline-group { margin-bottom: 1rem; }
.timeline-group-key { color: var(--cyan); font-weight: 600; margin-bottom: 0.4rem; }

.entry-card {
    display: block;
    background: var(--accent);
    border-radius: 4px;
    padding: 0.5rem;
    margin-bottom: 0.5rem;
    color: var(--fg);
}
.entry-card:hover { text-decoration: none; background: #e6dfc8; }
.entry-card.current { border-left: 3px solid var(--blue); }
.entry-card .author { font-weight: 600; color: var(--base01); }
.entry-card .meta { font-size: 0.75rem; color: var(--muted); margin-left: 0.5rem; }
.entry-card .snippet { font-size: 0.85rem; margin-top: 0.25rem; }
.entry-card .clips { font-size: 0.75rem; color: var(--cyan); margin-top: 0.25rem; }

.editor-toolbar { display: flex; gap: 0.5rem; flex-wrap: wrap; align-items: center; margin-bottom: 0.75rem; }
.editor-toolbar .spacer { flex: 1; }

.entry-meta {
    display: flex;
    flex-wrap: wrap;
    gap: 0.25rem 1rem;
    background: var(--accent);
    padding: 0.5rem 0.75rem;
    border-radius: 4px;
    font-size: 0.8rem;
    margin-bottom: 0.75rem;
}

.structured-fields label { display: block; font-size: 0.8rem; font-weight: 600; margin-top: 0.5rem; }

.preview {
    margin-top: 1rem;
    padding: 0.75rem;
    border: 1px dashed var(--base1);
    border-radius: 4px;
    min-height: 3rem;
}
.preview pre { background: var(--accent); padding: 0.5rem; overflow-x: auto; }

.attachments { margin-top: 1rem; }
.attachment { display: inline-block; margin: 0 0.5rem 0.5rem 0; vertical-align: top; }
.attachment img, .attachment video { max-height: 8rem; border-radius: 4px; }

.diff-view { margin-top: 1rem; font-size: 0.8rem; }
.diff-view pre { background: var(--accent); padding: 0.5rem; overflow-x: auto; white-space: pre-wrap; }

/* Paper editor */
.paper-layout {
    display: grid;
    grid-template-columns: 1fr 1fr;
    gap: 1rem;
}
@media (max-width: 900px) { .paper-layout { grid-template-columns: 1fr; } }
#paper-editor { min-height: 60vh; font-family: "SF Mono", "Consolas", "Liberation Mono", monospace; }
#pdf-preview { width: 100%; min-height: 60vh; border: 1px solid var(--base1); border-radius: 4px; background: white; }

.journal-matches { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 0.75rem; margin-top: 1rem; }
.journal-card {
    display: block;
    border: 1px solid var(--base1);
    border-radius: 6px;
    padding: 0.75rem;
    color: var(--fg);
}
.journal-card:hover { background: var(--accent); text-decoration: none; }
.journal-card .name { font-weight: 600; color: var(--base01); }
.journal-card .description { font-size: 0.85rem; }
.journal-card .url { font-size: 0.75rem; color: var(--cyan); word-break: break-all; }

#copilot-modal {
    position: fixed;
    top: 120px;
    left: calc(50vw - 220px);
    width: 440px;
    z-index: 9999;
    background: var(--bg);
    border: 2px solid var(--cyan);
    border-radius: 12px;
    box-shadow: 0 0 32px rgba(42, 161, 152, 0.25);
}
#copilot-modal-header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    padding: 0.75rem 1rem 0;
    cursor: move;
    user-select: none;
}
#copilot-modal-header h3 { margin: 0; }
#copilot-chat-window { min-height: 200px; max-height: 320px; overflow-y: auto; padding: 0.75rem; }
#copilot-chat-form { display: flex; gap: 0.5rem; margin: 0.75rem; }
#copilot-chat-input { flex: 1; }
.chat-msg { margin-bottom: 0.5rem; }
.chat-msg.user { text-align: right; }
.chat-msg span { display: inline-block; padding: 0.4rem 0.75rem; border-radius: 4px; white-space: pre-wrap; text-align: left; }
.chat-msg.user span { background: var(--blue); color: var(--base3); }
.chat-msg.copilot span { background: var(--accent); }
.noselect, .noselect * { user-select: none !important; }

.login-form { max-width: 360px; margin: 3rem auto; display: flex; flex-direction: column; gap: 0.75rem; }
.login-form form { display: flex; flex-direction: column; gap: 0.5rem; }
"#;
