//! HTML templates and styling for the lab notebook and paper editor.
//!
//! ## Module Structure
//!
//! - `styles` - CSS constants and theme definitions
//! - `components` - Shared HTML components (nav bar, toast, base template)
//! - `notebook` - Timeline and entry editor
//! - `paper` - Paper editor with preview, journal cards and copilot

mod styles;
mod components;
mod notebook;
mod paper;

pub use styles::STYLE;
pub use components::{base_html, nav_bar, page_html, project_query, toast};
pub use notebook::{
    render_attachment, render_attachments, render_diffs, render_entry_meta,
    render_notebook_page, render_preview, render_timeline, NotebookView,
};
pub use paper::{journal_card, journal_cards, paper_link, render_paper_editor};
