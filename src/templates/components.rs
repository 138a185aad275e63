//! Shared HTML components: navigation bar, toast, and the base page.

use crate::notebook::html_escape;

use super::styles::STYLE;

// ============================================================================
// Navigation Bar
// ============================================================================

/// Query suffix carrying the project id between pages.
pub fn project_query(project_id: Option<&str>) -> String {
    match project_id.filter(|p| !p.is_empty()) {
        Some(p) => format!("?project_id={}", html_escape(&urlencoding::encode(p))),
        None => String::new(),
    }
}

pub fn nav_bar(project_id: Option<&str>, logged_in: bool, user: Option<&str>) -> String {
    let query = project_query(project_id);
    let user = user
        .filter(|name| logged_in && !name.is_empty())
        .map(|name| format!(r#"<span class="user">{}</span>"#, html_escape(name)))
        .unwrap_or_default();
    let auth_link = if logged_in {
        r#"<a href="/logout">Logout</a>"#
    } else {
        r#"<a href="/login">Login</a>"#
    };

    format!(
        r#"<nav class="nav-bar">
            <a href="/notebook{query}">Notebook</a>
            <a href="/paper{query}">Paper</a>
            <span class="spacer"></span>
            {user}
            {auth_link}
        </nav>"#,
        query = query,
        user = user,
        auth_link = auth_link
    )
}

// ============================================================================
// Feedback
// ============================================================================

pub fn toast(message: &str) -> String {
    format!(r#"<div class="toast" role="status">{}</div>"#, html_escape(message))
}

// ============================================================================
// Base Template
// ============================================================================

pub fn base_html(title: &str, content: &str, logged_in: bool) -> String {
    page_html(title, content, None, logged_in, None, "")
}

/// Full page with the project-aware nav bar and optional trailing scripts.
pub fn page_html(
    title: &str,
    content: &str,
    project_id: Option<&str>,
    logged_in: bool,
    user: Option<&str>,
    scripts: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    {nav}
    <div class="container">
        {content}
    </div>
    {scripts}
</body>
</html>"#,
        title = html_escape(title),
        STYLE = STYLE,
        nav = nav_bar(project_id, logged_in, user),
        content = content,
        scripts = scripts
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_links_carry_project() {
        let nav = nav_bar(Some("p 1"), true, None);
        assert!(nav.contains(r#"href="/notebook?project_id=p%201""#));
        assert!(nav.contains(r#"href="/paper?project_id=p%201""#));
        assert!(nav.contains("Logout"));
    }

    #[test]
    fn test_nav_without_project() {
        let nav = nav_bar(None, false, Some("Ada"));
        assert!(nav.contains(r#"href="/notebook""#));
        assert!(nav.contains("Login"));
        assert!(!nav.contains("Ada"));
    }

    #[test]
    fn test_nav_shows_escaped_user_name() {
        let nav = nav_bar(Some("p1"), true, Some("Ada <Lab>"));
        assert!(nav.contains(r#"<span class="user">Ada &lt;Lab&gt;</span>"#));
        let user_at = nav.find("class=\"user\"").unwrap();
        let logout_at = nav.find("Logout").unwrap();
        assert!(user_at < logout_at);
    }

    #[test]
    fn test_base_html_escapes_title() {
        let page = base_html("<b>x</b>", "<p>body</p>", false);
        assert!(page.contains("<title>&lt;b&gt;x&lt;/b&gt;</title>"));
        assert!(page.contains("<p>body</p>"));
    }
}
