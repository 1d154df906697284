//! Serve command - runs the Startpage web server.

use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tokio::signal::unix::{SignalKind, signal};
use tower_cookies::{CookieManagerLayer, Cookies};

use startpage::{
    Startpages, User,
    backend::database::{DbKind, InMemory, SqlxBackend},
    events::NtfyNotifier,
};

use super::{api, auth, pages};
use crate::backend::{create_backend, save_snapshot};
use crate::cli::ServeArgs;
use crate::session::{SESSION_COOKIE, SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub startpages: Startpages,
    pub sessions: SessionStore,
}

/// The logged-in account, re-read from storage on every request.
///
/// Requests without a live session are redirected to the login page.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let token = cookies
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(login_redirect)?;
        let id = state
            .sessions
            .get_user(&token)
            .await
            .ok_or_else(login_redirect)?;

        match state.startpages.user(id).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(e) if e.is_not_found() => {
                // The account is gone; its session is useless.
                state.sessions.destroy_session(&token).await;
                Err(login_redirect())
            }
            Err(e) => {
                tracing::error!(user = %id, error = %e, "Failed to load session user");
                Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
            }
        }
    }
}

fn login_redirect() -> Response {
    Redirect::to("/login").into_response()
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::handle_default_page))
        .route("/health", get(handle_health_endpoint))
        .route("/login", get(auth::handle_login_page).post(auth::handle_login_submit))
        .route(
            "/register",
            get(auth::handle_register_page).post(auth::handle_register_submit),
        )
        .route("/logout", post(auth::handle_logout))
        .route("/profile", get(pages::handle_profile))
        .route("/profile/username", post(pages::handle_change_username))
        .route("/profile/page/new", post(pages::handle_create_page))
        .route("/profile/page/import", post(pages::handle_import_page))
        .route("/profile/page/{id}/edit", post(pages::handle_edit_page))
        .route("/profile/page/{id}/delete", post(pages::handle_delete_page))
        .route("/profile/page/{id}/default", post(pages::handle_set_default))
        .route("/profile/page/{id}/export", get(pages::handle_export_page))
        .route(
            "/api/update-section-order/",
            post(api::handle_update_section_order),
        )
        .route("/api/update-link-order/", post(api::handle_update_link_order))
        .route("/api/get-item-details/", get(api::handle_get_item_details))
        .route("/api/save-item-details/", post(api::handle_save_item_details))
        .route("/api/add-link/", post(api::handle_add_link))
        .route("/api/add-section/", post(api::handle_add_section))
        .route("/api/delete-item/", post(api::handle_delete_item))
        .route("/api/update-theme/", post(api::handle_update_theme))
        .route("/{username}/{slug}/", get(pages::handle_addressed_page))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// Run the Startpage server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Create the storage backend
    let backend = create_backend(&args.backend_config).await?;
    let startpages = Startpages::open(backend).await?;

    let notifier = NtfyNotifier::new(args.ntfy_base_url.clone(), args.ntfy_topic.clone())?;
    match notifier.endpoint() {
        Some(endpoint) => tracing::info!(%endpoint, "ntfy notifications configured"),
        None => tracing::info!("ntfy base URL or topic not set, notifications disabled"),
    }
    startpages.subscribe(Arc::new(notifier));

    let app_state = AppState {
        startpages,
        sessions: SessionStore::new(),
    };
    let app = router(app_state.clone());

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    println!("Startpage server started");
    println!();
    println!("Web interface: http://localhost:{}", local_addr.port());
    println!();
    println!("Available endpoints:");
    println!("  GET  /                  - Default start page (JSON)");
    println!("  GET  /{{user}}/{{slug}}/    - A specific start page (JSON)");
    println!("  GET  /login, /register  - Account pages");
    println!("  GET  /profile           - Manage pages, import and username");
    println!("  POST /api/...           - In-place editing API");
    println!("  GET  /health            - Health check");
    println!();
    println!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Save state on shutdown (only needed for InMemory backend)
    match save_snapshot(&app_state.startpages, &args.backend_config).await {
        Ok(true) => println!("\nSnapshot saved successfully"),
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to save snapshot: {e:?}");
            eprintln!("Failed to save snapshot: {e:?}");
        }
    }

    println!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Cannot install signal handlers ({e}), waiting for Ctrl+C");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Cannot listen for Ctrl+C: {e}");
                }
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
        _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
    }
}

/// Health check response
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// `sqlite`, `postgres` or `inmemory`
    pub backend: String,
    /// Live login sessions
    pub sessions: usize,
}

/// Handler for GET /health - Health check endpoint
async fn handle_health_endpoint(State(state): State<AppState>) -> axum::Json<HealthResponse> {
    let backend = state.startpages.backend();
    let backend_type = if let Some(sqlx) = backend.as_any().downcast_ref::<SqlxBackend>() {
        match sqlx.kind() {
            DbKind::Sqlite => "sqlite",
            DbKind::Postgres => "postgres",
        }
    } else if backend.as_any().is::<InMemory>() {
        "inmemory"
    } else {
        "unknown"
    };

    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        backend: backend_type.to_string(),
        sessions: state.sessions.session_count().await,
    })
}
