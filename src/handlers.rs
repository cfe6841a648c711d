// handlers.rs
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, FromRequest, FromRequestParts, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::auth::{self, AuthUser};
use crate::error::{AppError, AppResult};
use crate::ledger;
use crate::models::{
    CreatePollRequest, LoginRequest, PollId, PollView, RegisterRequest, TokenResponse,
    UpdatePollRequest, UserResponse, VoteCountsResponse, VoteRequest,
};
use crate::poll;
use crate::state::AppState;

/// `Json` that answers malformed bodies with our error format.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` that answers malformed ids with our error format.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

/// Liveness check
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let seconds = state.started_at.elapsed().as_secs();
    let uptime = format!(
        "{}h {}m {}s",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    );

    Json(json!({
        "status": "ok",
        "message": format!("Poll backend is running! Uptime: {uptime}"),
    }))
}

/// Create a poll owned by the caller
pub async fn create_poll(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<CreatePollRequest>,
) -> AppResult<(StatusCode, Json<PollView>)> {
    let created = poll::create_poll(
        state.store.as_ref(),
        user_id,
        &body.title,
        &body.description,
        body.options,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch all polls with their options and vote counts
pub async fn list_polls(State(state): State<AppState>) -> AppResult<Json<Vec<PollView>>> {
    Ok(Json(poll::list_polls(state.store.as_ref()).await?))
}

pub async fn get_poll(
    State(state): State<AppState>,
    AppPath(poll_id): AppPath<PollId>,
) -> AppResult<Json<PollView>> {
    Ok(Json(poll::get_poll(state.store.as_ref(), poll_id).await?))
}

/// Change title and description (creator only)
pub async fn update_poll(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(poll_id): AppPath<PollId>,
    AppJson(body): AppJson<UpdatePollRequest>,
) -> AppResult<Json<PollView>> {
    let store = state.store.as_ref();
    poll::update_poll(store, poll_id, user_id, &body.title, &body.description).await?;
    Ok(Json(poll::get_poll(store, poll_id).await?))
}

/// Delete a poll (creator only)
pub async fn delete_poll(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(poll_id): AppPath<PollId>,
) -> AppResult<StatusCode> {
    poll::delete_poll(state.store.as_ref(), poll_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Vote for an option, replacing any earlier vote by the caller
pub async fn vote(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(poll_id): AppPath<PollId>,
    AppJson(body): AppJson<VoteRequest>,
) -> AppResult<Json<VoteCountsResponse>> {
    let store = state.store.as_ref();
    ledger::cast_vote(store, poll_id, body.poll_option_id, user_id).await?;
    let vote_counts = ledger::tally(store, poll_id).await?;
    Ok(Json(VoteCountsResponse { vote_counts }))
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = auth::register(
        state.store.as_ref(),
        &body.username,
        &body.email,
        &body.password,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = auth::login(
        state.store.as_ref(),
        &state.sessions,
        &body.email,
        &body.password,
    )
    .await?;
    Ok(Json(TokenResponse { token }))
}
