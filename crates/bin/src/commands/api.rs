//! JSON endpoints used by the in-place editor on the start page.
//!
//! Successful calls answer `{"status": "success", ...}`; failures answer
//! `{"status": "error", "message": ...}` with a status code derived from
//! [`ErrorKind`].

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use startpage::{
    ColorSchemeId, ErrorKind, ItemKind, LinkId, SectionId, constants::MAX_LINKS_PER_SECTION,
};

use super::serve::{AppState, CurrentUser};

/// An error answered as `{"status": "error", "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Status code for an error classification.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::CapacityExceeded | ErrorKind::InvalidInput | ErrorKind::InvalidFormat => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<startpage::Error> for ApiError {
    fn from(err: startpage::Error) -> Self {
        let status = status_for(err.kind());
        if status.is_server_error() {
            tracing::error!(module = err.module(), error = %err, "Request failed");
            return Self::new(status, "Internal server error");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({"status": "error", "message": self.message})),
        )
            .into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn success() -> Json<Value> {
    Json(json!({"status": "success"}))
}

/// An id as sent by the browser: a number, or a number in a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    fn get(&self) -> Option<i64> {
        match self {
            RawId::Int(id) => Some(*id),
            RawId::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Ids that cannot name a row cannot be owned either.
fn require_id(raw: &RawId) -> Result<i64, ApiError> {
    raw.get()
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Not found"))
}

fn item_kind(raw: &str) -> Result<ItemKind, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "Invalid type"))
}

#[derive(Deserialize)]
pub struct SectionOrderRequest {
    #[serde(default)]
    ids: Vec<RawId>,
}

/// Handler for POST /api/update-section-order/
pub async fn handle_update_section_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SectionOrderRequest>,
) -> ApiResult {
    let ids: Vec<SectionId> = request
        .ids
        .iter()
        .filter_map(RawId::get)
        .map(SectionId)
        .collect();
    state.startpages.reorder_sections(user.id, &ids).await?;
    Ok(success())
}

#[derive(Deserialize)]
pub struct LinkOrderRequest {
    section_id: RawId,
    #[serde(default)]
    link_ids: Vec<RawId>,
}

/// Handler for POST /api/update-link-order/
pub async fn handle_update_link_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<LinkOrderRequest>,
) -> ApiResult {
    if request.link_ids.len() > MAX_LINKS_PER_SECTION {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Section cannot contain more than {MAX_LINKS_PER_SECTION} links."),
        ));
    }
    let target = SectionId(require_id(&request.section_id)?);
    let ids: Vec<LinkId> = request
        .link_ids
        .iter()
        .filter_map(RawId::get)
        .map(LinkId)
        .collect();
    state.startpages.reorder_links(user.id, target, &ids).await?;
    Ok(success())
}

#[derive(Deserialize)]
pub struct ItemQuery {
    #[serde(rename = "type")]
    item_type: String,
    id: RawId,
}

/// Handler for GET /api/get-item-details/?type=...&id=...
pub async fn handle_get_item_details(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ItemQuery>,
) -> ApiResult {
    let kind = item_kind(&query.item_type)?;
    let id = require_id(&query.id)?;
    let detail = state.startpages.item_detail(user.id, kind, id).await?;
    Ok(Json(json!(detail)))
}

#[derive(Deserialize)]
pub struct SaveItemRequest {
    #[serde(rename = "type")]
    item_type: String,
    id: RawId,
    #[serde(default)]
    name: String,
    url: Option<String>,
}

/// Handler for POST /api/save-item-details/
pub async fn handle_save_item_details(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SaveItemRequest>,
) -> ApiResult {
    let kind = item_kind(&request.item_type)?;
    let id = require_id(&request.id)?;
    state
        .startpages
        .save_item(user.id, kind, id, &request.name, request.url.as_deref())
        .await?;
    Ok(success())
}

#[derive(Deserialize)]
pub struct AddLinkRequest {
    section_id: RawId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

/// Handler for POST /api/add-link/
pub async fn handle_add_link(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AddLinkRequest>,
) -> ApiResult {
    let section = SectionId(require_id(&request.section_id)?);
    let link = state
        .startpages
        .add_link(user.id, section, &request.name, &request.url)
        .await
        .map_err(|e| {
            if e.is_capacity_exceeded() {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    format!("Max {MAX_LINKS_PER_SECTION} links per section allowed."),
                )
            } else {
                e.into()
            }
        })?;
    Ok(Json(json!({
        "status": "success",
        "link": {"id": link.id, "name": link.name, "url": link.url},
    })))
}

#[derive(Deserialize)]
pub struct AddSectionRequest {
    #[serde(default)]
    name: String,
}

/// Handler for POST /api/add-section/
pub async fn handle_add_section(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AddSectionRequest>,
) -> ApiResult {
    if request.name.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Name is required"));
    }
    let section = state.startpages.add_section(user.id, &request.name).await?;
    Ok(Json(json!({
        "status": "success",
        "section": {"id": section.id, "name": section.name},
    })))
}

#[derive(Deserialize)]
pub struct DeleteItemRequest {
    #[serde(rename = "type", default)]
    item_type: String,
    id: RawId,
}

/// Handler for POST /api/delete-item/
pub async fn handle_delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<DeleteItemRequest>,
) -> ApiResult {
    let kind = item_kind(&request.item_type)?;
    let id = require_id(&request.id)?;
    state.startpages.delete_item(user.id, kind, id).await?;
    Ok(success())
}

#[derive(Deserialize)]
pub struct UpdateThemeRequest {
    theme_id: Option<RawId>,
}

/// Handler for POST /api/update-theme/
///
/// A missing or null `theme_id` clears the selection.
pub async fn handle_update_theme(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateThemeRequest>,
) -> ApiResult {
    let scheme = match &request.theme_id {
        Some(raw) => Some(ColorSchemeId(require_id(raw)?)),
        None => None,
    };
    state.startpages.select_theme(user.id, scheme).await?;
    Ok(success())
}
