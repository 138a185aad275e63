//! HTTP route handlers for login, the notebook timeline and editor,
//! attachments and the AI summary. Paper editor routes live in `paper`.

use crate::auth::{access_token, clear_token, current_user, is_logged_in, token_cookie};
use crate::models::{EditMode, GroupBy, NotebookEntry, StructuredContent};
use crate::notebook::{
    build_save_request, filter_entries, format_location, group_entries, html_escape,
    mode_for_entry, EntryDraft,
};
use crate::templates::{base_html, page_html, render_notebook_page, render_preview, NotebookView};
use crate::SharedState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;

fn notebook_url(project_id: &str) -> String {
    format!("/notebook?project_id={}", urlencoding::encode(project_id))
}

// ============================================================================
// Index
// ============================================================================

pub async fn index() -> Redirect {
    Redirect::to("/notebook")
}

// ============================================================================
// Authentication Handlers
// ============================================================================

fn login_html(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<div class="message error">{}</div>"#, html_escape(e)))
        .unwrap_or_default();
    format!(
        r#"<div class="login-form">
            {error}
            <h1>Login</h1>
            <form method="POST" action="/login">
                <input type="email" name="email" placeholder="Email" autofocus>
                <input type="password" name="password" placeholder="Password">
                <button class="btn" type="submit">Login</button>
            </form>
            <p class="muted">Or paste an access token:</p>
            <form method="POST" action="/login">
                <input type="password" name="token" placeholder="Access token">
                <button class="btn secondary" type="submit">Use token</button>
            </form>
        </div>"#,
        error = error
    )
}

pub async fn login_page(jar: CookieJar) -> Response {
    if is_logged_in(&jar) {
        return Redirect::to("/").into_response();
    }
    Html(base_html("Login", &login_html(None), false)).into_response()
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginForm {
    pub token: String,
    pub email: String,
    pub password: String,
}

pub async fn login_submit(
    State(state): State<SharedState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<LoginForm>,
) -> Response {
    let token = form.token.trim();
    let token = if !token.is_empty() {
        token.to_string()
    } else if !form.email.trim().is_empty() && !form.password.is_empty() {
        match state.api.login(form.email.trim(), &form.password).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                let html = login_html(Some("Login failed."));
                return Html(base_html("Login", &html, false)).into_response();
            }
        }
    } else {
        let html = login_html(Some("Enter an email and password, or a token."));
        return Html(base_html("Login", &html, false)).into_response();
    };

    tracing::info!("logged in");
    (jar.add(token_cookie(token)), Redirect::to("/")).into_response()
}

pub async fn logout(jar: CookieJar) -> Response {
    (clear_token(jar), Redirect::to("/")).into_response()
}

// ============================================================================
// Notebook Handlers
// ============================================================================

#[derive(Deserialize, Default)]
pub struct NotebookQuery {
    pub project_id: Option<String>,
    pub entry: Option<String>,
    pub group: Option<String>,
    pub q: Option<String>,
    pub mode: Option<String>,
    pub saved: Option<String>,
}

impl NotebookQuery {
    /// Requested grouping; unknown values fall back to the default.
    fn group_by(&self) -> GroupBy {
        self.group
            .as_deref()
            .and_then(GroupBy::from_param)
            .unwrap_or_default()
    }

    fn edit_mode(&self) -> Option<EditMode> {
        self.mode.as_deref().and_then(EditMode::from_param)
    }
}

fn notebook_notice(message: &str, logged_in: bool) -> Html<String> {
    let html = format!(
        r#"<h1>Lab Notebook</h1><div class="message">{}</div>"#,
        html_escape(message)
    );
    Html(base_html("Lab Notebook", &html, logged_in))
}

pub async fn notebook_page(
    Query(query): Query<NotebookQuery>,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Html<String> {
    let token = match access_token(&jar) {
        Some(t) => t,
        None => return notebook_notice("Log in to see the lab notebook.", false),
    };
    let project_id = match query.project_id.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => p,
        None => return notebook_notice("Open a project to see its notebook.", true),
    };

    let (entries, user) = tokio::join!(
        state.api.list_entries(&token, project_id),
        current_user(&state.api, &token),
    );
    let entries: Vec<NotebookEntry> = entries.unwrap_or_else(|e| {
        tracing::warn!(error = %e, project_id, "could not load notebook");
        Vec::new()
    });

    let search = query.q.as_deref().unwrap_or("");
    let group_by = query.group_by();
    let filtered = filter_entries(&entries, search);
    let groups = group_entries(&filtered, group_by);

    let current = query
        .entry
        .as_deref()
        .filter(|id| !id.is_empty())
        .and_then(|id| entries.iter().find(|e| e.id == id));
    let mode = query.edit_mode().unwrap_or_else(|| mode_for_entry(current));
    let user_name = user.map(|u| u.name).filter(|n| !n.is_empty());

    let view = NotebookView {
        project_id,
        groups: &groups,
        group_by,
        search,
        current,
        mode,
        saved: query.saved.is_some(),
        logged_in: true,
        user: user_name.as_deref(),
    };
    Html(render_notebook_page(&view))
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SaveEntryForm {
    pub project_id: String,
    pub entry_id: String,
    pub mode: EditMode,
    pub content: String,
    pub observation: String,
    pub hypothesis: String,
    pub method: String,
    pub result: String,
    pub conclusion: String,
    pub location: String,
}

impl SaveEntryForm {
    fn fields(&self) -> StructuredContent {
        StructuredContent {
            observation: self.observation.clone(),
            hypothesis: self.hypothesis.clone(),
            method: self.method.clone(),
            result: self.result.clone(),
            conclusion: self.conclusion.clone(),
        }
    }
}

/// Reformat a browser-supplied `lat,lon` pair; anything else is dropped.
fn normalize_location(raw: &str) -> Option<String> {
    let (lat, lon) = raw.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    Some(format_location(lat, lon))
}

pub async fn save_entry(
    State(state): State<SharedState>,
    jar: CookieJar,
    headers: HeaderMap,
    axum::Form(form): axum::Form<SaveEntryForm>,
) -> Response {
    let back = notebook_url(&form.project_id);
    let token = match access_token(&jar) {
        Some(t) if !form.project_id.is_empty() => t,
        _ => return Redirect::to(&back).into_response(),
    };

    let device = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let draft = EntryDraft {
        entry_id: Some(form.entry_id.clone()),
        mode: form.mode,
        content: form.content.clone(),
        fields: form.fields(),
        device,
        location: normalize_location(&form.location),
    };
    let request = build_save_request(draft, &form.project_id, Utc::now());

    match state.api.save_entry(&token, &form.project_id, &request).await {
        Ok(saved) => {
            tracing::info!(entry_id = %saved.id, project_id = %form.project_id, "entry saved");
            Redirect::to(&format!("{}&saved=1", back)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, project_id = %form.project_id, "could not save entry");
            let mut target = back;
            if !form.entry_id.is_empty() {
                target.push_str(&format!("&entry={}", urlencoding::encode(&form.entry_id)));
            }
            Redirect::to(&target).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct PreviewBody {
    #[serde(default)]
    pub mode: EditMode,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub fields: StructuredContent,
}

pub async fn notebook_preview(Json(body): Json<PreviewBody>) -> Html<String> {
    Html(render_preview(body.mode, &body.content, &body.fields))
}

// ============================================================================
// Attachments
// ============================================================================

pub async fn upload_attachments(
    State(state): State<SharedState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let mut project_id = String::new();
    let mut entry_id = String::new();
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "project_id" => project_id = field.text().await.unwrap_or_default(),
            "entry_id" => entry_id = field.text().await.unwrap_or_default(),
            "file" => {
                let filename = field.file_name().unwrap_or("attachment").to_string();
                match field.bytes().await {
                    Ok(bytes) if !bytes.is_empty() => files.push((filename, bytes.to_vec())),
                    Ok(_) => {}
                    Err(e) => {
                        return (StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e))
                            .into_response()
                    }
                }
            }
            _ => {}
        }
    }

    let back = format!(
        "{}&entry={}",
        notebook_url(&project_id),
        urlencoding::encode(&entry_id)
    );
    let token = match access_token(&jar) {
        Some(t) if !project_id.is_empty() && !entry_id.is_empty() => t,
        _ => return Redirect::to(&back).into_response(),
    };

    for (filename, bytes) in files {
        match state
            .api
            .upload_attachment(&token, &entry_id, &filename, bytes)
            .await
        {
            Ok(()) => tracing::info!(entry_id = %entry_id, filename = %filename, "attachment uploaded"),
            Err(e) => tracing::warn!(error = %e, entry_id = %entry_id, "attachment upload failed"),
        }
    }

    Redirect::to(&back).into_response()
}

pub async fn download_attachment(
    State(state): State<SharedState>,
    Path(attachment_id): Path<String>,
) -> Response {
    match state.api.download_attachment(&attachment_id).await {
        Ok(download) => {
            let mut headers = HeaderMap::new();
            let content_type = download
                .content_type
                .as_deref()
                .unwrap_or("application/octet-stream");
            if let Ok(value) = content_type.parse() {
                headers.insert(header::CONTENT_TYPE, value);
            }
            if let Some(value) = download
                .content_disposition
                .as_deref()
                .and_then(|d| d.parse().ok())
            {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            (headers, download.bytes).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, attachment_id = %attachment_id, "attachment download failed");
            let status = e
                .status()
                .and_then(|s| StatusCode::from_u16(s.as_u16()).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            (status, "Attachment unavailable").into_response()
        }
    }
}

// ============================================================================
// AI Summary
// ============================================================================

#[derive(Deserialize, Default)]
pub struct SummaryQuery {
    pub project_id: Option<String>,
    pub style: Option<String>,
}

pub async fn summary_page(
    Query(query): Query<SummaryQuery>,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Html<String> {
    let project_id = query.project_id.unwrap_or_default();
    let style = query
        .style
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "verbose".to_string());

    let summary = match access_token(&jar) {
        Some(token) if !project_id.is_empty() => {
            match state.api.summary(&token, &project_id, &style).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(error = %e, project_id = %project_id, "summary failed");
                    None
                }
            }
        }
        _ => None,
    };

    let body = summary
        .map(|text| format!(r#"<div class="preview" id="notebook-summary">{}</div>"#, html_escape(&text).replace('\n', "<br>")))
        .unwrap_or_default();
    let html = format!(
        r#"<h1>AI Summary</h1>
        <p class="muted">Style: {style}</p>
        {body}
        <p><a href="{back}">&larr; Back to timeline</a></p>"#,
        style = html_escape(&style),
        body = body,
        back = html_escape(&notebook_url(&project_id)),
    );

    let project = Some(project_id.as_str()).filter(|p| !p.is_empty());
    Html(page_html("AI Summary", &html, project, is_logged_in(&jar), None, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use mockito::{Matcher, Server};

    const BOUNDARY: &str = "labbook-test-boundary";

    fn token_jar() -> CookieJar {
        CookieJar::new().add(token_cookie("tok".to_string()))
    }

    /// Multipart request body from `(name, filename, value)` parts.
    async fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Multipart {
        let mut body = String::new();
        for (name, filename, value) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        let request = Request::builder()
            .method("POST")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_upload_forwards_each_file_separately() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/notebook-entries/e1/attachments")
            .match_header("authorization", "Bearer tok")
            .with_status(201)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let state = crate::testing::state(&server.url(), dir.path());

        let form = multipart(&[
            ("project_id", None, "p1"),
            ("entry_id", None, "e1"),
            ("file", Some("gel.png"), "PNGDATA"),
            ("file", Some("plate.csv"), "a,b\n1,2"),
        ])
        .await;
        let response = upload_attachments(State(state), token_jar(), form).await;

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/notebook?project_id=p1&entry=e1");
    }

    #[tokio::test]
    async fn test_upload_needs_token_and_entry() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let state = crate::testing::state(&server.url(), dir.path());

        let form = multipart(&[
            ("project_id", None, "p1"),
            ("entry_id", None, "e1"),
            ("file", Some("gel.png"), "PNGDATA"),
        ])
        .await;
        upload_attachments(State(state.clone()), CookieJar::new(), form).await;

        let form = multipart(&[
            ("project_id", None, "p1"),
            ("file", Some("gel.png"), "PNGDATA"),
        ])
        .await;
        let response = upload_attachments(State(state), token_jar(), form).await;

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_save_entry_records_user_agent_and_redirects() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/projects/p1/notebook")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "id": null,
                "content": "Ran the gel",
                "structured": null,
                "device": "TestAgent/1.0",
                "location": "51.5074,-0.1278",
                "visibility": "team",
                "experiment_id": "p1"
            })))
            .with_status(201)
            .with_body(r#"{"id":"e9"}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let state = crate::testing::state(&server.url(), dir.path());

        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, "TestAgent/1.0".parse().unwrap());
        let form = SaveEntryForm {
            project_id: "p1".to_string(),
            content: "Ran the gel".to_string(),
            location: "51.507351,-0.127758".to_string(),
            ..Default::default()
        };
        let response = save_entry(State(state), token_jar(), headers, axum::Form(form)).await;

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/notebook?project_id=p1&saved=1");
    }

    #[tokio::test]
    async fn test_failed_save_returns_to_entry_without_toast() {
        let mut server = Server::new_async().await;
        server
            .mock("PATCH", "/projects/p1/notebook")
            .with_status(500)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let state = crate::testing::state(&server.url(), dir.path());

        let form = SaveEntryForm {
            project_id: "p1".to_string(),
            entry_id: "e1".to_string(),
            content: "edit".to_string(),
            ..Default::default()
        };
        let response =
            save_entry(State(state), token_jar(), HeaderMap::new(), axum::Form(form)).await;
        assert_eq!(location(&response), "/notebook?project_id=p1&entry=e1");
    }

    #[test]
    fn test_notebook_query_tolerates_unknown_values() {
        let uri = "/notebook?project_id=p1&group=weekly&mode=wysiwyg".parse().unwrap();
        let Query(query) = Query::<NotebookQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.group_by(), GroupBy::Day);
        assert_eq!(query.edit_mode(), None);

        let uri = "/notebook?group=session&mode=structured".parse().unwrap();
        let Query(query) = Query::<NotebookQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.group_by(), GroupBy::Session);
        assert_eq!(query.edit_mode(), Some(EditMode::Structured));
    }

    #[tokio::test]
    async fn test_notebook_page_renders_with_unknown_group() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/projects/p1/notebook")
            .with_status(200)
            .with_body(r#"[{"id":"e1","timestamp":"2024-05-01T10:00:00","content":"Seeded plates"}]"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let state = crate::testing::state(&server.url(), dir.path());

        let query = NotebookQuery {
            project_id: Some("p1".to_string()),
            group: Some("weekly".to_string()),
            ..Default::default()
        };
        let Html(page) = notebook_page(Query(query), State(state), token_jar()).await;
        assert!(page.contains("Seeded plates"));
        assert!(page.contains(r#"<option value="day" selected>"#));
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(
            normalize_location("51.507351, -0.127758").as_deref(),
            Some("51.5074,-0.1278")
        );
        assert_eq!(normalize_location(""), None);
        assert_eq!(normalize_location("north,south"), None);
    }

    #[test]
    fn test_save_form_fields() {
        let form = SaveEntryForm {
            observation: "o".to_string(),
            conclusion: "c".to_string(),
            ..Default::default()
        };
        let fields = form.fields();
        assert_eq!(fields.observation, "o");
        assert_eq!(fields.conclusion, "c");
        assert!(fields.method.is_empty());
    }

    #[test]
    fn test_preview_body_accepts_flat_fields() {
        let body: PreviewBody = serde_json::from_str(
            r#"{"mode":"structured","content":"","observation":"blue","hypothesis":"","method":"","result":"","conclusion":""}"#,
        )
        .unwrap();
        assert_eq!(body.mode, EditMode::Structured);
        assert_eq!(body.fields.observation, "blue");
    }

    #[test]
    fn test_login_html_escapes_error() {
        let html = login_html(Some("<bad>"));
        assert!(html.contains("&lt;bad&gt;"));
        assert!(html.contains(r#"name="token""#));
    }

    #[test]
    fn test_notebook_url_encodes_project() {
        assert_eq!(notebook_url("a&b"), "/notebook?project_id=a%26b");
    }
}
