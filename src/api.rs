//! Typed client for the lab API.
//!
//! Every operation is one request/response exchange. Nothing is retried
//! except journal matching, which falls back to the legacy request shape.

use crate::models::{
    CopilotRequest, CopilotResponse, Journal, JournalMatchRequest, JournalMatchResponse,
    LoginResponse, NotebookEntry, PaperContent, Project, ProjectStep, SaveEntryRequest,
    SummaryResponse, User,
};
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Shown when the assistant answers without a reply.
pub const NO_REPLY: &str = "[No response]";

/// Header the backend reads to scope copilot context to a project
pub const PROJECT_ID_HEADER: &str = "X-Project-Id";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Upstream status code, when the API answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Raw attachment bytes plus the headers needed to serve them again.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    /// Joins already-encoded path segments onto the base URL.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let mut base = self.base.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> Result<RequestBuilder, ApiError> {
        let builder = self.http.request(method, self.url(path)?);
        Ok(match token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        })
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = Self::check(response).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path, token)?.json(body).send().await?;
        Self::json(response).await
    }

    // ========================================================================
    // Notebook
    // ========================================================================

    pub async fn list_entries(&self, token: &str, project_id: &str) -> Result<Vec<NotebookEntry>, ApiError> {
        let path = format!("projects/{}/notebook", urlencoding::encode(project_id));
        let response = self.request(Method::GET, &path, Some(token))?.send().await?;
        Self::json(response).await
    }

    /// Creates the entry when the request has no id, updates it otherwise.
    pub async fn save_entry(
        &self,
        token: &str,
        project_id: &str,
        entry: &SaveEntryRequest,
    ) -> Result<NotebookEntry, ApiError> {
        let method = if entry.id.is_some() {
            Method::PATCH
        } else {
            Method::POST
        };
        let path = format!("projects/{}/notebook", urlencoding::encode(project_id));
        self.send_json(method, &path, Some(token), entry).await
    }

    pub async fn upload_attachment(
        &self,
        token: &str,
        entry_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let path = format!("notebook-entries/{}/attachments", urlencoding::encode(entry_id));
        let response = self
            .request(Method::POST, &path, Some(token))?
            .multipart(form)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn download_attachment(&self, attachment_id: &str) -> Result<Download, ApiError> {
        let path = format!(
            "notebook-attachments/{}/download",
            urlencoding::encode(attachment_id)
        );
        let response = Self::check(self.request(Method::GET, &path, None)?.send().await?).await?;
        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let content_disposition = header(CONTENT_DISPOSITION);
        let bytes = response.bytes().await?.to_vec();
        Ok(Download {
            bytes,
            content_type,
            content_disposition,
        })
    }

    pub async fn summary(&self, token: &str, project_id: &str, style: &str) -> Result<String, ApiError> {
        let path = format!(
            "projects/{}/notebook/summary?style={}",
            urlencoding::encode(project_id),
            urlencoding::encode(style)
        );
        let response = self.request(Method::GET, &path, Some(token))?.send().await?;
        let body: SummaryResponse = Self::json(response).await?;
        Ok(body.summary)
    }

    // ========================================================================
    // Users & Projects
    // ========================================================================

    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response: LoginResponse = self
            .send_json(Method::POST, "auth/login", None, &body)
            .await?;
        Ok(response.access_token)
    }

    pub async fn get_user(&self, token: &str, sub: &str) -> Result<User, ApiError> {
        let path = format!("users/{}", urlencoding::encode(sub));
        let response = self.request(Method::GET, &path, Some(token))?.send().await?;
        Self::json(response).await
    }

    pub async fn get_project(&self, token: &str, project_id: &str) -> Result<Project, ApiError> {
        let path = format!("projects/{}", urlencoding::encode(project_id));
        let response = self.request(Method::GET, &path, Some(token))?.send().await?;
        Self::json(response).await
    }

    pub async fn project_steps(&self, token: &str, project_id: &str) -> Result<Vec<ProjectStep>, ApiError> {
        let path = format!("projects/{}/steps", urlencoding::encode(project_id));
        let response = self.request(Method::GET, &path, Some(token))?.send().await?;
        Self::json(response).await
    }

    pub async fn load_project_paper(&self, token: &str, project_id: &str) -> Result<String, ApiError> {
        let path = format!("projects/{}/paper", urlencoding::encode(project_id));
        let response = self.request(Method::GET, &path, Some(token))?.send().await?;
        let paper: PaperContent = Self::json(response).await?;
        Ok(paper.content)
    }

    pub async fn save_project_paper(&self, token: &str, project_id: &str, content: &str) -> Result<(), ApiError> {
        let path = format!("projects/{}/paper", urlencoding::encode(project_id));
        let response = self
            .request(Method::PUT, &path, Some(token))?
            .json(&PaperContent {
                content: content.to_string(),
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    // ========================================================================
    // Paper Assistance
    // ========================================================================

    async fn journal_match_once(
        &self,
        token: &str,
        request: &JournalMatchRequest<'_>,
    ) -> Result<Vec<Journal>, ApiError> {
        let response: JournalMatchResponse = self
            .send_json(Method::POST, "journal-match", Some(token), request)
            .await?;
        response
            .journals
            .ok_or_else(|| ApiError::Decode("response has no journals".to_string()))
    }

    /// Suggest journals for a manuscript.
    ///
    /// Any failure of the full request is retried once with the legacy
    /// content-only shape; if that fails too the result is empty.
    pub async fn journal_match(&self, token: &str, content: &str, experiment_context: &str) -> Vec<Journal> {
        let full = JournalMatchRequest {
            content,
            experiment_context: Some(experiment_context),
        };
        match self.journal_match_once(token, &full).await {
            Ok(journals) => return journals,
            Err(e) => {
                tracing::warn!(error = %e, "journal match failed, retrying with legacy request");
            }
        }

        let legacy = JournalMatchRequest {
            content,
            experiment_context: None,
        };
        match self.journal_match_once(token, &legacy).await {
            Ok(journals) => journals,
            Err(e) => {
                tracing::warn!(error = %e, "legacy journal match failed");
                Vec::new()
            }
        }
    }

    pub async fn copilot_chat(
        &self,
        token: &str,
        message: &str,
        experiment_context: &str,
        project_id: Option<&str>,
    ) -> Result<String, ApiError> {
        let mut builder = self
            .request(Method::POST, "copilot-chat", Some(token))?
            .json(&CopilotRequest {
                message,
                experiment_context,
            });
        if let Some(pid) = project_id.filter(|p| !p.is_empty()) {
            builder = builder.header(PROJECT_ID_HEADER, pid);
        }
        let response: CopilotResponse = Self::json(builder.send().await?).await?;
        Ok(response
            .reply
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| NO_REPLY.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StructuredContent;
    use mockito::{Matcher, Server};

    fn client(server: &Server) -> ApiClient {
        ApiClient::new(Url::parse(&server.url()).unwrap(), Duration::from_secs(5)).unwrap()
    }

    fn save_request(id: Option<&str>) -> SaveEntryRequest {
        SaveEntryRequest {
            id: id.map(str::to_string),
            content: "a\n\nb\n\nc\n\nd\n\ne".to_string(),
            structured: Some(StructuredContent {
                observation: "a".to_string(),
                hypothesis: "b".to_string(),
                method: "c".to_string(),
                result: "d".to_string(),
                conclusion: "e".to_string(),
            }),
            device: Some("test-agent".to_string()),
            location: None,
            visibility: "team".to_string(),
            session_id: "2024-01-01".to_string(),
            experiment_id: "p 1".to_string(),
        }
    }

    #[test]
    fn test_url_keeps_base_path() {
        let api = ApiClient::new(
            Url::parse("https://lab.example.org/api").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            api.url("projects/x/notebook").unwrap().as_str(),
            "https://lab.example.org/api/projects/x/notebook"
        );
    }

    #[tokio::test]
    async fn test_list_entries_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/projects/p%201/notebook")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"e1","content":"hello","attachments":[]}]"#)
            .create_async()
            .await;

        let entries = client(&server).list_entries("tok", "p 1").await.unwrap();
        mock.assert_async().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_list_entries_non_ok_is_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/projects/p/notebook")
            .with_status(401)
            .with_body("expired")
            .create_async()
            .await;

        let err = client(&server).list_entries("tok", "p").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_save_entry_posts_new_and_patches_existing() {
        let mut server = Server::new_async().await;
        let post = server
            .mock("POST", "/projects/p%201/notebook")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "id": null,
                "content": "a\n\nb\n\nc\n\nd\n\ne",
                "visibility": "team",
                "experiment_id": "p 1"
            })))
            .with_status(201)
            .with_body(r#"{"id":"new"}"#)
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/projects/p%201/notebook")
            .match_body(Matcher::PartialJson(serde_json::json!({ "id": "e1" })))
            .with_status(200)
            .with_body(r#"{"id":"e1"}"#)
            .create_async()
            .await;

        let api = client(&server);
        let created = api.save_entry("tok", "p 1", &save_request(None)).await.unwrap();
        let updated = api
            .save_entry("tok", "p 1", &save_request(Some("e1")))
            .await
            .unwrap();

        post.assert_async().await;
        patch.assert_async().await;
        assert_eq!(created.id, "new");
        assert_eq!(updated.id, "e1");
    }

    #[tokio::test]
    async fn test_upload_attachment_is_multipart_file_field() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/notebook-entries/e1/attachments")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex(
                r#"name="file"; filename="gel.png""#.to_string(),
            ))
            .with_status(201)
            .with_body(r#"{"id":"a1","filename":"gel.png"}"#)
            .create_async()
            .await;

        client(&server)
            .upload_attachment("tok", "e1", "gel.png", b"PNG".to_vec())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_attachment_keeps_headers() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/notebook-attachments/a1/download")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_header("content-disposition", "attachment; filename=gel.png")
            .with_body(vec![1u8, 2, 3])
            .create_async()
            .await;

        let download = client(&server).download_attachment("a1").await.unwrap();
        assert_eq!(download.bytes, vec![1, 2, 3]);
        assert_eq!(download.content_type.as_deref(), Some("image/png"));
        assert!(download
            .content_disposition
            .unwrap()
            .contains("gel.png"));
    }

    #[tokio::test]
    async fn test_summary_passes_style() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/projects/p/notebook/summary")
            .match_query(Matcher::UrlEncoded("style".into(), "bullet points".into()))
            .with_status(200)
            .with_body(r#"{"summary":"Short."}"#)
            .create_async()
            .await;

        let summary = client(&server)
            .summary("tok", "p", "bullet points")
            .await
            .unwrap();
        assert_eq!(summary, "Short.");
    }

    #[tokio::test]
    async fn test_journal_match_full_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/journal-match")
            .match_body(Matcher::Json(serde_json::json!({
                "content": "paper",
                "experiment_context": "ctx"
            })))
            .with_status(200)
            .with_body(r#"{"journals":[{"name":"Cell","description":"Biology","url":"https://cell.com"}]}"#)
            .create_async()
            .await;

        let journals = client(&server).journal_match("tok", "paper", "ctx").await;
        mock.assert_async().await;
        assert_eq!(journals.len(), 1);
        assert_eq!(journals[0].name, "Cell");
    }

    #[tokio::test]
    async fn test_journal_match_falls_back_to_legacy_shape() {
        let mut server = Server::new_async().await;
        let full = server
            .mock("POST", "/journal-match")
            .match_body(Matcher::Json(serde_json::json!({
                "content": "paper",
                "experiment_context": "ctx"
            })))
            .with_status(500)
            .create_async()
            .await;
        let legacy = server
            .mock("POST", "/journal-match")
            .match_body(Matcher::Json(serde_json::json!({ "content": "paper" })))
            .with_status(200)
            .with_body(r#"{"journals":[{"name":"PLOS ONE","url":"https://plos.org"}]}"#)
            .create_async()
            .await;

        let journals = client(&server).journal_match("tok", "paper", "ctx").await;
        full.assert_async().await;
        legacy.assert_async().await;
        assert_eq!(journals.len(), 1);
        assert_eq!(journals[0].description, None);
    }

    #[tokio::test]
    async fn test_journal_match_missing_journals_key_triggers_fallback() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/journal-match")
            .with_status(200)
            .with_body(r#"{"error":"model unavailable"}"#)
            .expect(2)
            .create_async()
            .await;

        let journals = client(&server).journal_match("tok", "paper", "ctx").await;
        mock.assert_async().await;
        assert!(journals.is_empty());
    }

    #[tokio::test]
    async fn test_copilot_chat_sends_project_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/copilot-chat")
            .match_header(PROJECT_ID_HEADER, "p1")
            .match_body(Matcher::Json(serde_json::json!({
                "message": "what next?",
                "experiment_context": "ctx"
            })))
            .with_status(200)
            .with_body(r#"{"reply":"Run a control."}"#)
            .create_async()
            .await;

        let reply = client(&server)
            .copilot_chat("tok", "what next?", "ctx", Some("p1"))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(reply, "Run a control.");
    }

    #[tokio::test]
    async fn test_copilot_chat_without_reply() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/copilot-chat")
            .with_status(200)
            .with_body(r#"{}"#)
            .create_async()
            .await;

        let reply = client(&server)
            .copilot_chat("tok", "hi", "ctx", None)
            .await
            .unwrap();
        assert_eq!(reply, NO_REPLY);
    }

    #[tokio::test]
    async fn test_login_and_user_lookup() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .match_body(Matcher::PartialJson(serde_json::json!({ "email": "a@b.c" })))
            .with_status(200)
            .with_body(r#"{"access_token":"jwt"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/users/u1")
            .match_header("authorization", "Bearer jwt")
            .with_status(200)
            .with_body(r#"{"id":"u1","name":"Ada","email":"a@b.c","role":"scientist"}"#)
            .create_async()
            .await;

        let api = client(&server);
        let token = api.login("a@b.c", "pw").await.unwrap();
        assert_eq!(token, "jwt");
        let user = api.get_user(&token, "u1").await.unwrap();
        assert_eq!(user.name, "Ada");
    }

    #[tokio::test]
    async fn test_project_paper_round_trip_requests() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/projects/p/paper")
            .with_status(200)
            .with_body(r##"{"content":"# Draft"}"##)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/projects/p/paper")
            .match_body(Matcher::Json(serde_json::json!({ "content": "# Final" })))
            .with_status(200)
            .with_body(r#"{"msg":"updated"}"#)
            .create_async()
            .await;

        let api = client(&server);
        assert_eq!(api.load_project_paper("tok", "p").await.unwrap(), "# Draft");
        api.save_project_paper("tok", "p", "# Final").await.unwrap();
        put.assert_async().await;
    }
}
