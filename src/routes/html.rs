//! Server-rendered markup. Every piece of user-supplied text goes through
//! [`escape`] before it lands in a page.

use std::fmt::Write as _;

use crate::auth::User;
use crate::snippets::repo_types::{Snippet, SnippetFields};
use crate::validation::FieldError;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn layout(title: &str, user: Option<&User>, notice: Option<&str>, body: &str) -> String {
    let nav_user = match user {
        Some(u) => format!(
            r#"<span class="whoami">Signed in as {}</span> <a href="/logout">Log out</a>"#,
            escape(&u.username)
        ),
        None => r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#.to_string(),
    };
    let notice = notice
        .map(|n| format!(r#"<p class="notice">{}</p>"#, escape(n)))
        .unwrap_or_default();
    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} · snipshare</title></head>
<body>
<nav><a href="/">Home</a> <a href="/snippets">Snippets</a> <a href="/search">Search</a> <a href="/submit-snippet">Submit</a> <a href="/about">About</a> | {nav_user}</nav>
{notice}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn error_list(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = String::from(r#"<ul class="errors">"#);
    for e in errors {
        let _ = write!(out, "<li>{}</li>", escape(&e.message));
    }
    out.push_str("</ul>");
    out
}

pub fn index() -> String {
    r#"<h1>snipshare</h1>
<p>Share, search and read code snippets.</p>
<p><a href="/submit-snippet">Submit a snippet</a> or <a href="/snippets">browse the latest</a>.</p>"#
        .to_string()
}

pub fn about() -> String {
    r#"<h1>About</h1>
<p>snipshare is a small place to keep code snippets. Anyone can submit one; snippets submitted while signed in carry your username.</p>"#
        .to_string()
}

pub fn register_form(username: &str, errors: &[FieldError]) -> String {
    format!(
        r#"<h1>Register</h1>
{errors}
<form method="post" action="/register">
<label>Username <input name="username" value="{username}" required></label>
<label>Password <input type="password" name="password" required></label>
<label>Confirm password <input type="password" name="confirmPassword" required></label>
<button type="submit">Register</button>
</form>"#,
        errors = error_list(errors),
        username = escape(username),
    )
}

pub fn login_form(errors: &[FieldError]) -> String {
    format!(
        r#"<h1>Log in</h1>
{errors}
<form method="post" action="/login">
<label>Username <input name="username" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>"#,
        errors = error_list(errors),
    )
}

pub fn search_page(query: &str, errors: &[FieldError], results: Option<&[Snippet]>) -> String {
    let results = match results {
        Some([]) => "<p>No snippets matched.</p>".to_string(),
        Some(rows) => snippet_table(rows),
        None => String::new(),
    };
    format!(
        r#"<h1>Search</h1>
{errors}
<form method="post" action="/search-results">
<input name="query" value="{query}" placeholder="Title contains…" required>
<button type="submit">Search</button>
</form>
{results}"#,
        errors = error_list(errors),
        query = escape(query),
    )
}

pub fn submit_form(fields: &SnippetFields, errors: &[FieldError]) -> String {
    format!(
        r#"<h1>Submit a snippet</h1>
{errors}
<form method="post" action="/submit-snippet">
<label>Title <input name="title" value="{title}" required></label>
<label>Language <input name="language" value="{language}" required></label>
<label>Description <textarea name="description">{description}</textarea></label>
<label>Code <textarea name="code" rows="16" required>{code}</textarea></label>
<button type="submit">Submit</button>
</form>"#,
        errors = error_list(errors),
        title = escape(&fields.title),
        language = escape(&fields.language),
        description = escape(fields.description.as_deref().unwrap_or_default()),
        code = escape(&fields.code),
    )
}

fn owner_label(snippet: &Snippet) -> String {
    snippet
        .username
        .as_deref()
        .map(escape)
        .unwrap_or_else(|| "anonymous".to_string())
}

fn created_label(snippet: &Snippet) -> String {
    snippet
        .created_at
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

pub fn snippet_table(snippets: &[Snippet]) -> String {
    if snippets.is_empty() {
        return "<p>No snippets yet.</p>".to_string();
    }
    let mut out = String::from(
        "<table class=\"snippets\"><thead><tr><th>Title</th><th>Language</th><th>By</th><th>Created</th></tr></thead><tbody>",
    );
    for s in snippets {
        let _ = write!(
            out,
            r#"<tr><td><a href="/snippet/{id}">{title}</a></td><td>{language}</td><td>{owner}</td><td>{created}</td></tr>"#,
            id = s.id,
            title = escape(&s.title),
            language = escape(&s.language),
            owner = owner_label(s),
            created = created_label(s),
        );
    }
    out.push_str("</tbody></table>");
    out
}

pub fn snippets_page(snippets: &[Snippet]) -> String {
    format!("<h1>Latest snippets</h1>\n{}", snippet_table(snippets))
}

pub fn snippet_detail(snippet: &Snippet) -> String {
    let description = snippet
        .description
        .as_deref()
        .map(|d| format!(r#"<p class="description">{}</p>"#, escape(d)))
        .unwrap_or_default();
    format!(
        r#"<article class="snippet">
<h1>{title}</h1>
<p class="meta">{language} · by {owner} · {created}</p>
{description}
<pre><code class="language-{language}">{code}</code></pre>
</article>"#,
        title = escape(&snippet.title),
        language = escape(&snippet.language),
        owner = owner_label(snippet),
        created = created_label(snippet),
        code = escape(&snippet.code),
    )
}

pub fn message(heading: &str, text: &str) -> String {
    format!("<h1>{}</h1>\n<p>{}</p>", escape(heading), escape(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(code: &str, username: Option<&str>) -> Snippet {
        Snippet {
            id: 5,
            user_id: username.map(|_| 1),
            title: "<b>Hello</b>".into(),
            code: code.into(),
            description: None,
            language: "python".into(),
            created_at: time::macros::datetime!(2024-01-02 03:04:05 UTC),
            username: username.map(str::to_string),
        }
    }

    #[test]
    fn escape_covers_html_metacharacters() {
        assert_eq!(
            escape(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#x27;y&#x27;)&lt;&#x2F;script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn detail_escapes_code_and_shows_anonymous_owner() {
        let html = snippet_detail(&snippet("if a < b { }", None));
        assert!(html.contains("if a &lt; b { }"));
        assert!(html.contains("&lt;b&gt;Hello&lt;&#x2F;b&gt;"));
        assert!(html.contains("by anonymous"));
        assert!(html.contains("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn table_links_each_snippet() {
        let html = snippet_table(&[snippet("x", Some("alice"))]);
        assert!(html.contains(r#"href="/snippet/5""#));
        assert!(html.contains("alice"));
        assert_eq!(snippet_table(&[]), "<p>No snippets yet.</p>");
    }

    #[test]
    fn layout_shows_identity_and_notice() {
        let user = User {
            id: 1,
            username: "alice".into(),
            password_hash: String::new(),
        };
        let html = layout("Home", Some(&user), Some("Welcome"), "<p>body</p>");
        assert!(html.contains("Signed in as alice"));
        assert!(html.contains(r#"<p class="notice">Welcome</p>"#));
        assert!(html.contains("<p>body</p>"));

        let html = layout("Home", None, None, "");
        assert!(html.contains(r#"href="/login""#));
        assert!(!html.contains("notice"));
    }

    #[test]
    fn search_page_distinguishes_no_results_from_no_search() {
        assert!(search_page("foo", &[], Some(&[][..])).contains("No snippets matched."));
        assert!(!search_page("", &[], None).contains("No snippets"));
    }
}
