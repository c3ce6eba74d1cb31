use axum::{
    extract::State,
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::dto::{LoginRequest, LoginResponse, MessageResponse, PublicUser, RegisterRequest},
    error::AppResult,
    session::{cookie, CurrentUser, MaybeUser},
    state::AppState,
    validation::{into_result, validate_login, validate_registration},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    into_result(validate_registration(
        &payload.username,
        &payload.password,
        &payload.confirm_password,
        state.config.min_password_len,
    ))?;

    state
        .accounts
        .register(&payload.username, &payload.password, &payload.confirm_password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful! Please log in.",
        }),
    ))
}

#[instrument(skip(state, identity, payload))]
pub async fn login(
    State(state): State<AppState>,
    identity: MaybeUser,
    Json(payload): Json<LoginRequest>,
) -> AppResult<([(header::HeaderName, String); 1], Json<LoginResponse>)> {
    into_result(validate_login(&payload.username, &payload.password))?;

    let user = state
        .accounts
        .authenticate(&payload.username, &payload.password)
        .await?;
    let session = state
        .sessions
        .login(&user, identity.session)
        .await?;

    let set_cookie = cookie::set_session_cookie(
        session.id,
        state.sessions.ttl().whole_seconds(),
        state.config.session.cookie_secure,
    );
    info!(user_id = user.id, "user logged in");
    Ok((
        [(header::SET_COOKIE, set_cookie)],
        Json(LoginResponse {
            message: "Login successful",
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, identity))]
pub async fn logout(
    State(state): State<AppState>,
    identity: MaybeUser,
) -> AppResult<([(header::HeaderName, String); 1], Json<MessageResponse>)> {
    if let Some(id) = identity.session {
        state.sessions.logout(id).await?;
    }
    Ok((
        [(
            header::SET_COOKIE,
            cookie::clear_session_cookie(state.config.session.cookie_secure),
        )],
        Json(MessageResponse {
            message: "You have been logged out.",
        }),
    ))
}

#[instrument(skip(user))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}
