//! Login, registration and logout.

use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_cookies::{Cookie, Cookies};

use startpage::UserId;

use super::serve::AppState;
use crate::flash::{self, Flash, Level};
use crate::session::SESSION_COOKIE;
use crate::templates;

/// Login form data
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Registration form data
#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    password_confirm: String,
}

fn error(message: impl Into<String>) -> Flash {
    Flash {
        level: Level::Error,
        message: message.into(),
    }
}

async fn has_session(state: &AppState, cookies: &Cookies) -> bool {
    match cookies.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.get_user(cookie.value()).await.is_some(),
        None => false,
    }
}

async fn start_session(state: &AppState, cookies: &Cookies, user: UserId) {
    let token = state.sessions.create_session(user).await;
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
}

/// Handler for GET /login - Show login page
pub async fn handle_login_page(State(state): State<AppState>, cookies: Cookies) -> Response {
    if has_session(&state, &cookies).await {
        return Redirect::to("/profile").into_response();
    }
    let pending = flash::take(&cookies);
    Html(templates::login_page(pending.as_ref())).into_response()
}

/// Handler for POST /login - Process login
pub async fn handle_login_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    match state
        .startpages
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Logged in");
            start_session(&state, &cookies, user.id).await;
            Redirect::to("/profile").into_response()
        }
        Err(e) => {
            tracing::debug!(username = %form.username, error = %e, "Login failed");
            Html(templates::login_page(Some(&error(format!("Login failed: {e}"))))).into_response()
        }
    }
}

/// Handler for POST /logout - Logout and destroy session
pub async fn handle_logout(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        state.sessions.destroy_session(cookie.value()).await;
        let mut removal = Cookie::from(SESSION_COOKIE);
        removal.set_path("/");
        cookies.remove(removal);
    }
    flash::success(&cookies, "You have been logged out.");
    Redirect::to("/login")
}

/// Handler for GET /register - Show registration page
pub async fn handle_register_page(State(state): State<AppState>, cookies: Cookies) -> Response {
    if has_session(&state, &cookies).await {
        return Redirect::to("/profile").into_response();
    }
    Html(templates::register_page(None)).into_response()
}

/// Handler for POST /register - Process registration
pub async fn handle_register_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.password != form.password_confirm {
        return Html(templates::register_page(Some(&error("Passwords do not match"))))
            .into_response();
    }

    match state
        .startpages
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(user) => {
            start_session(&state, &cookies, user.id).await;
            flash::success(&cookies, format!("Welcome, {}!", user.username));
            Redirect::to("/profile").into_response()
        }
        Err(e) if e.is_conflict() => {
            Html(templates::register_page(Some(&error("This username is already taken."))))
                .into_response()
        }
        Err(e) => {
            if e.kind() == startpage::ErrorKind::Internal {
                tracing::error!(error = %e, "Registration failed");
            }
            Html(templates::register_page(Some(&error(format!(
                "Registration failed: {e}"
            )))))
            .into_response()
        }
    }
}
