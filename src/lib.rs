//! Labbook library - re-exports for testing and external use.
//!
//! A server-rendered frontend for a research lab notebook and paper editor.
//! All records live behind the lab API; this crate fetches, renders, and
//! forwards edits.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod notebook;
pub mod paper;
pub mod templates;

use api::{ApiClient, ApiError};
use config::Config;
use paper::{DraftError, DraftStore};
use thiserror::Error;

// ============================================================================
// Application State
// ============================================================================

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Drafts(#[from] DraftError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub drafts: DraftStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let api = ApiClient::new(config.api_url.clone(), config.api_timeout)?;
        let drafts = DraftStore::open(&config.db_path)?;
        Ok(Self {
            config,
            api,
            drafts,
        })
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    /// State wired to a mock API, with drafts in `dir`.
    pub fn state(api_url: &str, dir: &Path) -> SharedState {
        let config = Config {
            api_url: url::Url::parse(api_url).unwrap(),
            bind: "127.0.0.1:0".parse().unwrap(),
            db_path: dir.join("db"),
            api_timeout: Duration::from_secs(5),
        };
        Arc::new(AppState::new(config).unwrap())
    }
}

// Re-export commonly used types
pub use models::{
    Attachment, EditMode, EntryDiff, GroupBy, Journal, NotebookEntry, PreviewKind,
    SaveEntryRequest, StructuredContent, User,
};

pub use notebook::{
    build_save_request, filter_entries, format_timestamp, group_entries, html_escape,
    preview_kind, render_markdown, snippet, structured_content, structured_preview_markdown,
    EntryDraft, EntryGroup,
};

pub use auth::{access_token, current_user, is_logged_in, token_subject, TOKEN_COOKIE};

pub use paper::{experiment_context, ExperimentContext, ToolbarAction, TOOLBAR};
