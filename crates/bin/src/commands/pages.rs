//! Start page views and the page-style profile operations.
//!
//! Profile operations answer with a redirect to `/profile` and a flash
//! message. Pages that do not resolve under the current account are 404.

use axum::{
    Form, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use startpage::{PageId, page::PageView, settings::ColorScheme, slug::slugify};

use super::api::ApiError;
use super::serve::{AppState, CurrentUser};
use crate::{flash, templates};

/// A page with the theme it is rendered in.
#[derive(Serialize)]
pub struct StartpageResponse {
    #[serde(flatten)]
    view: PageView,
    theme: Option<ColorScheme>,
}

async fn render_view(
    state: &AppState,
    user: &startpage::User,
    address: Option<(&str, &str)>,
) -> Result<Json<StartpageResponse>, ApiError> {
    let view = state.startpages.resolve_page(user.id, address).await?;
    let theme = state.startpages.theme_for(user.id).await?;
    Ok(Json(StartpageResponse { view, theme }))
}

/// Handler for GET / - the default page, else the first page
pub async fn handle_default_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StartpageResponse>, ApiError> {
    render_view(&state, &user, None).await
}

/// Handler for GET /{username}/{slug}/
pub async fn handle_addressed_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((username, slug)): Path<(String, String)>,
) -> Result<Json<StartpageResponse>, ApiError> {
    render_view(&state, &user, Some((&username, &slug))).await
}

/// Handler for GET /profile
pub async fn handle_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    cookies: Cookies,
) -> Result<Html<String>, ApiError> {
    let pages = state.startpages.list_pages(user.id).await?;
    let schemes = state.startpages.list_color_schemes().await?;
    let pending = flash::take(&cookies);
    Ok(Html(templates::profile_page(
        &user,
        &pages,
        &schemes,
        pending.as_ref(),
    )))
}

fn to_profile() -> Response {
    Redirect::to("/profile").into_response()
}

/// Redirect with a flash message; missing pages are a plain 404.
fn finish<T>(
    cookies: &Cookies,
    result: startpage::Result<T>,
    message: impl FnOnce(T) -> String,
) -> Response {
    match result {
        Ok(value) => {
            flash::success(cookies, message(value));
            to_profile()
        }
        Err(e) if e.is_not_found() => (StatusCode::NOT_FOUND, "Page not found").into_response(),
        Err(e) => {
            if e.kind() == startpage::ErrorKind::Internal {
                tracing::error!(module = e.module(), error = %e, "Profile operation failed");
            }
            flash::error(cookies, e.to_string());
            to_profile()
        }
    }
}

/// Checkbox value as submitted by an HTML form.
fn checked(value: Option<&str>) -> bool {
    matches!(value, Some("on" | "true" | "1"))
}

#[derive(Deserialize)]
pub struct PageForm {
    #[serde(default)]
    title: String,
    is_default: Option<String>,
}

/// Handler for POST /profile/page/new
pub async fn handle_create_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    cookies: Cookies,
    Form(form): Form<PageForm>,
) -> Response {
    let result = state
        .startpages
        .create_page(user.id, &form.title, checked(form.is_default.as_deref()))
        .await;
    finish(&cookies, result, |page| {
        format!("Page '{}' created.", page.title)
    })
}

/// Handler for POST /profile/page/{id}/edit
pub async fn handle_edit_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    cookies: Cookies,
    Path(id): Path<i64>,
    Form(form): Form<PageForm>,
) -> Response {
    let result = state
        .startpages
        .edit_page(
            user.id,
            PageId(id),
            &form.title,
            checked(form.is_default.as_deref()),
        )
        .await;
    finish(&cookies, result, |page| {
        format!("Page '{}' updated.", page.title)
    })
}

/// Handler for POST /profile/page/{id}/delete
pub async fn handle_delete_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> Response {
    let result = state.startpages.delete_page(user.id, PageId(id)).await;
    finish(&cookies, result, |()| "Page deleted.".to_string())
}

/// Handler for POST /profile/page/{id}/default
pub async fn handle_set_default(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> Response {
    let result = state.startpages.set_default_page(user.id, PageId(id)).await;
    finish(&cookies, result, |page| {
        format!("'{}' is now your default page.", page.title)
    })
}

/// Handler for GET /profile/page/{id}/export - JSON document as a download
pub async fn handle_export_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let document = state.startpages.export_page(user.id, PageId(id)).await?;
    let json = document.to_json()?;
    let mut name = slugify(&document.title);
    if name.is_empty() {
        name = "startpage".to_string();
    }
    let disposition = format!("attachment; filename=\"{name}.json\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        json,
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct ImportForm {
    #[serde(default)]
    json_data: String,
}

/// Handler for POST /profile/page/import
pub async fn handle_import_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    cookies: Cookies,
    Form(form): Form<ImportForm>,
) -> Response {
    match state.startpages.import_json(user.id, &form.json_data).await {
        Ok(page) => {
            flash::success(
                &cookies,
                format!("Page '{}' imported successfully.", page.title),
            );
        }
        Err(e) => {
            tracing::info!(user_id = %user.id, error = %e, "Import rejected");
            flash::error(&cookies, format!("Import failed: {e}"));
        }
    }
    to_profile()
}

#[derive(Deserialize)]
pub struct UsernameForm {
    #[serde(default)]
    username: String,
}

/// Handler for POST /profile/username
pub async fn handle_change_username(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    cookies: Cookies,
    Form(form): Form<UsernameForm>,
) -> Response {
    match state
        .startpages
        .change_username(user.id, &form.username)
        .await
    {
        Ok(updated) => {
            flash::success(&cookies, format!("Username changed to '{}'.", updated.username));
        }
        Err(e) if e.is_conflict() => {
            flash::error(&cookies, "This username is already taken.");
        }
        Err(e) => flash::error(&cookies, e.to_string()),
    }
    to_profile()
}
