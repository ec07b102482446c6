//! HTTP routes and handlers
//!
//! Handlers only call the public operations of the scraper, cache, session
//! and allowlist; all extraction logic lives below this layer.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{info, warn};

use super::AppState;
use crate::cache::EntryStatus;
use crate::error::{Error, ErrorCategory, MancheteErrorTrait};
use crate::models::{Article, SiteSnapshot};
use crate::parser::sanitize::{escape_attribute, escape_html};

/// Header carrying the admin token
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

// ============================================================================
// API Response Types
// ============================================================================

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Rejection of a site outside the allowlist
#[derive(Debug, Serialize)]
pub struct HostRejected {
    pub error: String,
    pub site: String,
    pub allowed: Vec<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub cache: Vec<EntryStatus>,
}

/// Article list with its timestamp
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub updated_at: DateTime<Utc>,
    pub items: Vec<Article>,
}

/// Cookie update request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CookieUpdate {
    pub cookies: String,
}

#[derive(Debug, Serialize)]
pub struct CookieUpdated {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SiteQuery {
    pub site: Option<String>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/noticias", get(news_page))
        .route("/api/noticias/json", get(news_json))
        .route("/api/noticias/cached", get(news_cached))
        .route("/api/admin/cookies", post(update_cookies))
        .route("/api/admin/uol-cookies", post(update_cookies))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        cache: state.cache.status().await,
    })
}

/// Resolve the requested site and check it against the allowlist
fn allowed_site(state: &AppState, query: SiteQuery) -> Result<String, Response> {
    let site = query
        .site
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| state.default_site.clone());

    if state.allowlist.is_allowed(&site) {
        Ok(site)
    } else {
        warn!(site = %site, "Rejected request for host outside allowlist");
        Err((
            StatusCode::BAD_REQUEST,
            Json(HostRejected {
                error: "Host not allowed".to_string(),
                site,
                allowed: state.allowlist.allowed_hosts().to_vec(),
            }),
        )
            .into_response())
    }
}

fn upstream_error(err: Error) -> Response {
    let status = match err.category() {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

/// Live articles; an empty live result is backed by the cached snapshot
async fn live_or_cached(state: &AppState, site: &str) -> Result<NewsResponse, Error> {
    let items = state.scraper.fetch_articles(site).await?;

    if items.is_empty() {
        if let Some(snapshot) = state.cache.get(site).await {
            return Ok(NewsResponse {
                updated_at: snapshot.updated_at,
                items: snapshot.items,
            });
        }
    }

    Ok(NewsResponse {
        updated_at: Utc::now(),
        items,
    })
}

/// Minimal HTML list of the site's articles
async fn news_page(State(state): State<AppState>, Query(query): Query<SiteQuery>) -> Response {
    let site = match allowed_site(&state, query) {
        Ok(site) => site,
        Err(rejection) => return rejection,
    };

    match live_or_cached(&state, &site).await {
        Ok(news) => Html(render_list(&news.items)).into_response(),
        Err(e) => upstream_error(e),
    }
}

async fn news_json(State(state): State<AppState>, Query(query): Query<SiteQuery>) -> Response {
    let site = match allowed_site(&state, query) {
        Ok(site) => site,
        Err(rejection) => return rejection,
    };

    match live_or_cached(&state, &site).await {
        Ok(news) => Json(news).into_response(),
        Err(e) => upstream_error(e),
    }
}

async fn news_cached(State(state): State<AppState>, Query(query): Query<SiteQuery>) -> Response {
    let site = match allowed_site(&state, query) {
        Ok(site) => site,
        Err(rejection) => return rejection,
    };

    match state.cache.get(&site).await {
        Some(snapshot) => Json::<SiteSnapshot>(snapshot).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("No cached snapshot for {site}"))),
        )
            .into_response(),
    }
}

/// Replace the session cookies; requires the admin token
async fn update_cookies(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CookieUpdate>, JsonRejection>,
) -> Response {
    let token = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    let authorized = match (state.admin_token.as_deref(), token) {
        (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
        _ => false,
    };
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new("Unauthorized"))).into_response();
    }

    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected cookie update body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Invalid JSON body")),
            )
                .into_response();
        }
    };
    if update.cookies.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new("Missing cookies"))).into_response();
    }

    match state.session.update_cookies(&update.cookies).await {
        Ok(count) => {
            info!(count, "Cookies updated through admin endpoint");
            Json(CookieUpdated {
                status: "cookies updated".to_string(),
                count,
            })
            .into_response()
        }
        Err(Error::Validation(e)) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Cookie update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to store cookies")),
            )
                .into_response()
        }
    }
}

/// Render articles as a standalone HTML page
pub fn render_list(items: &[Article]) -> String {
    let mut page = String::from(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Notícias</title></head><body>\n\
         <h1>Lista de notícias:</h1>\n<ul>\n",
    );

    for article in items {
        let _ = writeln!(
            page,
            "<li><a href=\"{}\" target=\"_blank\">{}</a></li>",
            escape_attribute(&article.url),
            escape_html(&article.title)
        );
    }

    page.push_str("</ul>\n</body></html>\n");
    page
}
