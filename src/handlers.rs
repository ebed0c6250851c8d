use crate::config::Backend;
use crate::errors::{AppError, StoreError};
use crate::identity::IdentityProvider;
use crate::models::{
    DaysResponse, LoginRequest, LoginResponse, SessionRequest, SessionResponse, StatsResponse,
    ToggleRequest, ToggleResponse,
};
use crate::state::{AppState, SessionKey, Sessions};
use crate::stats::build_stats;
use crate::store::Scope;
use crate::ui::{render_index, PageMode};
use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap},
    response::Html,
    Json,
};
use std::sync::Arc;
use tokio::sync::MutexGuard;
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    if state.backend == Backend::Remote {
        // Cards are fetched by the page once it holds a token.
        return Html(render_index(PageMode::SignIn, &[], 0.0));
    }

    let sessions = state.sessions.lock().await;
    let page = match sessions.get(&SessionKey::Device) {
        Some(tracker) => render_index(
            PageMode::Tracking,
            &tracker.view_models(),
            tracker.completion_ratio(),
        ),
        None => render_index(PageMode::Tracking, &[], 0.0),
    };
    Html(page)
}

pub async fn get_days(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DaysResponse>, AppError> {
    let (sessions, key) = session(&state, &headers).await?;
    let tracker = sessions.get(&key).ok_or(StoreError::IdentityMissing)?;
    Ok(Json(DaysResponse {
        days: tracker.view_models(),
        percent: tracker.completion_ratio(),
    }))
}

pub async fn toggle_day(
    State(state): State<AppState>,
    Path(day): Path<u32>,
    headers: HeaderMap,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    // Held across the store call: one toggle in flight at a time.
    let (mut sessions, key) = session(&state, &headers).await?;
    let tracker = sessions.get_mut(&key).ok_or(StoreError::IdentityMissing)?;

    let transition = tracker.toggle(day, &payload.notes).await?;

    Ok(Json(ToggleResponse {
        day: transition.into_view(),
        percent: tracker.completion_ratio(),
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    let (sessions, key) = session(&state, &headers).await?;
    let tracker = sessions.get(&key).ok_or(StoreError::IdentityMissing)?;
    Ok(Json(build_stats(tracker)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let identity = remote_identity(&state)?;
    identity.send_login_link(&payload.email).await?;
    Ok(Json(LoginResponse {
        message: "Check your email for the login link.".into(),
    }))
}

/// Loads (or reloads) the progress of the user behind `access_token`.
/// Other users' sessions are untouched.
pub async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let identity = remote_identity(&state)?;
    let identity = identity.current_user(&payload.access_token).await?;
    let user_id = identity.user_id.to_string();

    let tracker = state.open_tracker(Scope::User(identity)).await;
    let response = SessionResponse {
        user_id,
        completed: tracker.progress().len(),
        percent: tracker.completion_ratio(),
    };
    state.install(tracker).await;
    info!(user = %response.user_id, "session started");

    Ok(Json(response))
}

/// Resolve the caller and lock the session table with their tracker present.
///
/// The local backend has one device session. The remote backend requires a
/// bearer token on every request and keys trackers by the user it resolves to.
async fn session<'a>(
    state: &'a AppState,
    headers: &HeaderMap,
) -> Result<(MutexGuard<'a, Sessions>, SessionKey), AppError> {
    if state.backend == Backend::Local {
        return Ok((state.sessions.lock().await, SessionKey::Device));
    }

    let provider = remote_identity(state)?;
    let token = bearer_token(headers).ok_or(StoreError::IdentityMissing)?;
    let identity = provider.current_user(token).await?;
    let key = SessionKey::User(identity.user_id.clone());

    let mut sessions = state.sessions.lock().await;
    if let Some(tracker) = sessions.get_mut(&key) {
        tracker.reauthorize(identity);
    } else {
        let tracker = state.open_tracker(Scope::User(identity)).await;
        sessions.insert(key.clone(), tracker);
    }
    Ok((sessions, key))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn remote_identity(state: &AppState) -> Result<&Arc<dyn IdentityProvider>, AppError> {
    match (&state.backend, &state.identity) {
        (Backend::Remote, Some(identity)) => Ok(identity),
        _ => Err(AppError::not_found("sign-in is only available with the remote backend")),
    }
}
