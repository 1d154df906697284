//! HTML templates for the web interface
//!
//! Simple inline HTML templates without a template engine.

use startpage::{Page, User, settings::ColorScheme};

use crate::flash::{Flash, Level};

/// Common CSS styles for all pages
const COMMON_STYLES: &str = r#"
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        max-width: 1000px;
        margin: 40px auto;
        padding: 0 20px;
        background: #f5f5f5;
    }
    .container {
        background: white;
        padding: 30px;
        border-radius: 8px;
        box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    }
    h1 {
        color: #333;
        border-bottom: 2px solid #0066cc;
        padding-bottom: 10px;
    }
    h2 {
        color: #555;
        margin-top: 30px;
    }
    .info-row {
        margin: 10px 0;
        padding: 8px;
        background: #f9f9f9;
        border-radius: 4px;
    }
    .label {
        font-weight: bold;
        color: #666;
        display: inline-block;
        width: 150px;
    }
    .value {
        color: #0066cc;
    }
    form {
        margin: 20px 0;
    }
    .form-group {
        margin: 15px 0;
    }
    label {
        display: block;
        font-weight: bold;
        margin-bottom: 5px;
        color: #333;
    }
    input[type="text"],
    input[type="password"],
    textarea {
        width: 100%;
        padding: 10px;
        border: 1px solid #ddd;
        border-radius: 4px;
        font-size: 14px;
        box-sizing: border-box;
    }
    textarea {
        font-family: monospace;
        resize: vertical;
    }
    button {
        background: #0066cc;
        color: white;
        padding: 10px 20px;
        border: none;
        border-radius: 4px;
        cursor: pointer;
        font-size: 14px;
        font-weight: bold;
    }
    button:hover {
        background: #0052a3;
    }
    .logout-btn {
        background: #999;
        float: right;
    }
    .logout-btn:hover {
        background: #777;
    }
    table {
        width: 100%;
        border-collapse: collapse;
        margin: 20px 0;
    }
    th, td {
        text-align: left;
        padding: 12px;
        border-bottom: 1px solid #ddd;
    }
    th {
        background: #f0f0f0;
        font-weight: bold;
        color: #333;
    }
    tr:hover {
        background: #f9f9f9;
    }
    .error {
        color: #d9534f;
        background: #f2dede;
        padding: 10px;
        border-radius: 4px;
        margin: 10px 0;
    }
    .success {
        color: #3c763d;
        background: #dff0d8;
        padding: 10px;
        border-radius: 4px;
        margin: 10px 0;
    }
    .code {
        font-family: monospace;
        background: #f5f5f5;
        padding: 2px 6px;
        border-radius: 3px;
        font-size: 13px;
    }
    .inline {
        display: inline;
        margin: 0 4px 0 0;
    }
"#;

/// Render a pending flash message
fn flash_html(flash: Option<&Flash>) -> String {
    flash.map_or(String::new(), |f| {
        let class = match f.level {
            Level::Success => "success",
            Level::Error => "error",
        };
        format!(r#"<div class="{class}">{}</div>"#, html_escape(&f.message))
    })
}

/// Render the login page
pub fn login_page(flash: Option<&Flash>) -> String {
    let flash_html = flash_html(flash);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Startpage - Login</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
        <h1>Startpage</h1>
        <h2>Login</h2>
        {flash_html}
        <form method="POST" action="/login">
            <div class="form-group">
                <label for="username">Username:</label>
                <input type="text" id="username" name="username" required autofocus>
            </div>
            <div class="form-group">
                <label for="password">Password:</label>
                <input type="password" id="password" name="password" required>
            </div>
            <button type="submit">Login</button>
        </form>
        <p style="margin-top: 20px; text-align: center;">
            Don't have an account? <a href="/register">Register here</a>
        </p>
    </div>
</body>
</html>"#
    )
}

/// Render the registration page
pub fn register_page(flash: Option<&Flash>) -> String {
    let flash_html = flash_html(flash);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Startpage - Register</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
        <h1>Startpage</h1>
        <h2>Register New Account</h2>
        {flash_html}
        <form method="POST" action="/register">
            <div class="form-group">
                <label for="username">Username:</label>
                <input type="text" id="username" name="username" required autofocus maxlength="150">
                <small style="color: #666;">Letters, digits and @ . + - _ only</small>
            </div>
            <div class="form-group">
                <label for="email">Email (optional):</label>
                <input type="text" id="email" name="email">
            </div>
            <div class="form-group">
                <label for="password">Password:</label>
                <input type="password" id="password" name="password" required>
            </div>
            <div class="form-group">
                <label for="password_confirm">Confirm Password:</label>
                <input type="password" id="password_confirm" name="password_confirm" required>
            </div>
            <button type="submit">Create Account</button>
        </form>
        <p style="margin-top: 20px; text-align: center;">
            Already have an account? <a href="/login">Login here</a>
        </p>
    </div>
</body>
</html>"#
    )
}

fn page_row(user: &User, page: &Page) -> String {
    let id = page.id;
    let title = html_escape(&page.title);
    let address = format!(
        "/{}/{}/",
        html_escape(&user.username),
        html_escape(&page.slug)
    );
    let default_cell = if page.is_default {
        "Default".to_string()
    } else {
        format!(
            r#"<form class="inline" method="POST" action="/profile/page/{id}/default"><button type="submit">Make default</button></form>"#
        )
    };
    format!(
        r#"<tr>
            <td><a href="{address}">{title}</a></td>
            <td class="code">{address}</td>
            <td>{default_cell}</td>
            <td>
                <form class="inline" method="POST" action="/profile/page/{id}/edit">
                    <input type="text" name="title" value="{title}" required maxlength="100">
                    <button type="submit">Rename</button>
                </form>
                <a href="/profile/page/{id}/export">Export</a>
                <form class="inline" method="POST" action="/profile/page/{id}/delete">
                    <button type="submit" class="logout-btn">Delete</button>
                </form>
            </td>
        </tr>"#
    )
}

/// Render the profile page: pages, import, username and theme.
pub fn profile_page(
    user: &User,
    pages: &[Page],
    schemes: &[ColorScheme],
    flash: Option<&Flash>,
) -> String {
    let flash_html = flash_html(flash);
    let username = html_escape(&user.username);

    let pages_html = if pages.is_empty() {
        r#"<p style="color: #666; font-style: italic;">No pages yet.</p>"#.to_string()
    } else {
        let rows: String = pages.iter().map(|p| page_row(user, p)).collect();
        format!(
            r#"<table>
            <tr><th>Title</th><th>Address</th><th></th><th></th></tr>
            {rows}
        </table>"#
        )
    };

    let themes_html: String = schemes
        .iter()
        .map(|s| {
            let marker = if user.color_scheme == Some(s.id) {
                " (selected)"
            } else {
                ""
            };
            format!(
                r#"<li data-theme-id="{}">{}{}</li>"#,
                s.id,
                html_escape(&s.name),
                marker
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Startpage - Profile</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
        <h1>
            {username}
            <form class="inline" method="POST" action="/logout" style="float: right;">
                <button type="submit" class="logout-btn">Logout</button>
            </form>
        </h1>
        {flash_html}

        <h2>Pages</h2>
        {pages_html}
        <form method="POST" action="/profile/page/new">
            <div class="form-group">
                <label for="title">New page title:</label>
                <input type="text" id="title" name="title" required maxlength="100">
            </div>
            <label><input type="checkbox" name="is_default" value="on"> Make default</label>
            <button type="submit">Create Page</button>
        </form>

        <h2>Import</h2>
        <form method="POST" action="/profile/page/import">
            <div class="form-group">
                <label for="json_data">Exported page JSON:</label>
                <textarea id="json_data" name="json_data" rows="6" required></textarea>
            </div>
            <button type="submit">Import Page</button>
        </form>

        <h2>Username</h2>
        <form method="POST" action="/profile/username">
            <div class="form-group">
                <input type="text" name="username" value="{username}" required maxlength="150">
            </div>
            <button type="submit">Change Username</button>
        </form>

        <h2>Themes</h2>
        <ul>{themes_html}</ul>
    </div>
</body>
</html>"#
    )
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
