//! Server-rendered pages. Markup is deliberately plain; every interpolated
//! value goes through [`escape`].

use axum::response::Html;

use crate::{auth::repo_types::User, survey::repo_types::SurveyResponse};

const GENDERS: &[(&str, &str)] = &[("м", "Male"), ("ж", "Female")];
const INTERESTS: &[(&str, &str)] = &[
    ("sports", "Sports"),
    ("music", "Music"),
    ("travel", "Travel"),
    ("reading", "Reading"),
    ("movies", "Movies"),
];

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, user: Option<&User>, flash: Option<&str>, body: &str) -> Html<String> {
    let nav = match user {
        Some(u) => format!(
            r#"<span>Signed in as {}</span> · <a href="/results">Results</a> · <a href="/logout">Log out</a>"#,
            escape(&u.username)
        ),
        None => r#"<a href="/login">Log in</a> · <a href="/register">Register</a>"#.to_string(),
    };
    let flash = flash
        .map(|m| format!(r#"<p class="flash">{}</p>"#, escape(m)))
        .unwrap_or_default();
    Html(format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
<nav><a href="/">Survey</a> · {nav}</nav>
{flash}
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    ))
}

pub fn index(user: Option<&User>, flash: Option<&str>) -> Html<String> {
    let genders: String = GENDERS
        .iter()
        .map(|(value, label)| {
            format!(r#"<label><input type="radio" name="gender" value="{value}"> {label}</label>"#)
        })
        .collect();
    let interests: String = INTERESTS
        .iter()
        .map(|(value, label)| {
            format!(r#"<label><input type="checkbox" name="interests" value="{value}"> {label}</label>"#)
        })
        .collect();
    let body = format!(
        r#"<form method="post" action="/submit">
<p><label>Name <input name="name"></label></p>
<p><label>Age <input name="age"></label></p>
<p>Gender {genders}</p>
<p>Interests {interests}</p>
<p><label>Comments <textarea name="comments"></textarea></label></p>
<p><button type="submit">Submit</button></p>
</form>"#
    );
    layout("Survey", user, flash, &body)
}

fn credentials_form(action: &str, button: &str) -> String {
    format!(
        r#"<form method="post" action="{action}">
<p><label>Username <input name="username"></label></p>
<p><label>Password <input type="password" name="password"></label></p>
<p><button type="submit">{button}</button></p>
</form>"#
    )
}

pub fn register(flash: Option<&str>) -> Html<String> {
    layout("Register", None, flash, &credentials_form("/register", "Register"))
}

pub fn login(flash: Option<&str>) -> Html<String> {
    layout("Log in", None, flash, &credentials_form("/login", "Log in"))
}

pub fn thank_you(user: &User) -> Html<String> {
    let body = format!(
        "<p>Thank you, {}! Your answers have been saved.</p>",
        escape(&user.username)
    );
    layout("Thank you", Some(user), None, &body)
}

pub fn results(user: &User, chart_base64: &str) -> Html<String> {
    let body = format!(
        r#"<img src="data:image/png;base64,{chart_base64}" alt="Gender distribution">"#
    );
    layout("Results", Some(user), None, &body)
}

pub fn admin_overview(admin: &User, users: &[User], responses: &[SurveyResponse]) -> Html<String> {
    let user_rows: String = users
        .iter()
        .map(|u| {
            format!(
                "<tr><td>{}</td><td>{}</td><td><code>{}</code></td></tr>",
                u.id,
                escape(&u.username),
                escape(&u.password_hash)
            )
        })
        .collect();
    let response_rows: String = responses
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                r.id,
                r.user_id,
                escape(&r.name),
                escape(&r.age),
                escape(&r.gender),
                escape(&r.interests_joined()),
                escape(&r.comments)
            )
        })
        .collect();
    let body = format!(
        r#"<h2>Users</h2>
<table><tr><th>id</th><th>username</th><th>password</th></tr>{user_rows}</table>
<h2>Survey responses</h2>
<table><tr><th>id</th><th>user</th><th>name</th><th>age</th><th>gender</th><th>interests</th><th>comments</th></tr>{response_rows}</table>
<p>JSON: <a href="/admin/users">/admin/users</a> · <a href="/admin/responses">/admin/responses</a></p>"#
    );
    layout("Admin", Some(admin), None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x")&'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&amp;&#x27;"
        );
    }

    #[test]
    fn flash_is_rendered_escaped() {
        let Html(page) = login(Some("<b>bad</b>"));
        assert!(page.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(!page.contains("<b>bad</b>"));
    }

    #[test]
    fn index_offers_multi_valued_interests() {
        let Html(page) = index(None, None);
        assert!(page.contains(r#"name="interests" value="sports""#));
        assert!(page.contains(r#"action="/submit""#));
    }
}
