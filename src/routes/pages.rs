use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        User,
    },
    error::AppError,
    routes::html,
    session::{cookie, MaybeUser},
    snippets::{dto::SearchRequest, handlers::parse_id, repo_types::SnippetFields},
    state::AppState,
    validation::{validate_login, validate_registration, FieldError},
};

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/about", get(about))
        .route("/register", get(register_page).post(register_submit))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout))
        .route("/search", get(search_page))
        .route("/search-results", post(search_results))
        .route("/snippets", get(snippets_page))
        .route("/submit-snippet", get(submit_page).post(submit_snippet))
        .route("/snippet/:id", get(snippet_page))
}

/// One-shot notice carried across a redirect as `?notice=<key>`.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    fn text(&self) -> Option<&'static str> {
        match self.notice.as_deref()? {
            "registered" => Some("Registration successful! Please log in."),
            "invalid" => Some("Invalid username or password."),
            "logged_out" => Some("You have been logged out."),
            "created" => Some("Snippet created successfully!"),
            _ => None,
        }
    }
}

fn render(
    status: StatusCode,
    title: &str,
    user: Option<&User>,
    notice: Option<&str>,
    body: String,
) -> Response {
    (status, Html(html::layout(title, user, notice, &body))).into_response()
}

fn error_page(err: AppError, user: Option<&User>) -> Response {
    if err.is_server_fault() {
        error!(error = %err, "page request failed");
    }
    let heading = match err.status() {
        StatusCode::NOT_FOUND => "Not found",
        StatusCode::INTERNAL_SERVER_ERROR => "Something went wrong",
        _ => "Request failed",
    };
    render(
        err.status(),
        heading,
        user,
        None,
        html::message(heading, &err.public_message()),
    )
}

#[instrument(skip(identity))]
pub async fn index(identity: MaybeUser, Query(q): Query<NoticeQuery>) -> Response {
    render(
        StatusCode::OK,
        "Home",
        identity.user.as_ref(),
        q.text(),
        html::index(),
    )
}

pub async fn about(identity: MaybeUser) -> Response {
    render(
        StatusCode::OK,
        "About",
        identity.user.as_ref(),
        None,
        html::about(),
    )
}

pub async fn register_page(identity: MaybeUser) -> Response {
    render(
        StatusCode::OK,
        "Register",
        identity.user.as_ref(),
        None,
        html::register_form("", &[]),
    )
}

#[instrument(skip(state, identity, form))]
pub async fn register_submit(
    State(state): State<AppState>,
    identity: MaybeUser,
    Form(form): Form<RegisterRequest>,
) -> Response {
    let user = identity.user.as_ref();
    let rerender = |errors: Vec<FieldError>| {
        render(
            StatusCode::BAD_REQUEST,
            "Register",
            user,
            None,
            html::register_form(&form.username, &errors),
        )
    };

    let errors = validate_registration(
        &form.username,
        &form.password,
        &form.confirm_password,
        state.config.min_password_len,
    );
    if !errors.is_empty() {
        return rerender(errors);
    }

    match state
        .accounts
        .register(&form.username, &form.password, &form.confirm_password)
        .await
    {
        Ok(()) => Redirect::to("/login?notice=registered").into_response(),
        Err(AppError::Validation(errors)) => rerender(errors),
        Err(AppError::Conflict(msg)) => rerender(vec![FieldError::new("username", msg)]),
        Err(e) => error_page(e, user),
    }
}

pub async fn login_page(identity: MaybeUser, Query(q): Query<NoticeQuery>) -> Response {
    render(
        StatusCode::OK,
        "Log in",
        identity.user.as_ref(),
        q.text(),
        html::login_form(&[]),
    )
}

#[instrument(skip(state, identity, form))]
pub async fn login_submit(
    State(state): State<AppState>,
    identity: MaybeUser,
    Form(form): Form<LoginRequest>,
) -> Response {
    let errors = validate_login(&form.username, &form.password);
    if !errors.is_empty() {
        return render(
            StatusCode::BAD_REQUEST,
            "Log in",
            None,
            None,
            html::login_form(&errors),
        );
    }

    let user = match state
        .accounts
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AppError::Auth(_)) => return Redirect::to("/login?notice=invalid").into_response(),
        Err(e) => return error_page(e, None),
    };

    match state
        .sessions
        .login(&user, identity.session)
        .await
    {
        Ok(session) => {
            let set_cookie = cookie::set_session_cookie(
                session.id,
                state.sessions.ttl().whole_seconds(),
                state.config.session.cookie_secure,
            );
            ([(header::SET_COOKIE, set_cookie)], Redirect::to("/")).into_response()
        }
        Err(e) => error_page(e, None),
    }
}

#[instrument(skip(state, identity))]
pub async fn logout(State(state): State<AppState>, identity: MaybeUser) -> Response {
    if let Some(id) = identity.session {
        if let Err(e) = state.sessions.logout(id).await {
            return error_page(e, None);
        }
    }
    (
        [(
            header::SET_COOKIE,
            cookie::clear_session_cookie(state.config.session.cookie_secure),
        )],
        Redirect::to("/?notice=logged_out"),
    )
        .into_response()
}

pub async fn search_page(identity: MaybeUser) -> Response {
    render(
        StatusCode::OK,
        "Search",
        identity.user.as_ref(),
        None,
        html::search_page("", &[], None),
    )
}

#[instrument(skip(state, identity))]
pub async fn search_results(
    State(state): State<AppState>,
    identity: MaybeUser,
    Form(form): Form<SearchRequest>,
) -> Response {
    let user = identity.user.as_ref();
    match state.snippets.search(&form.query).await {
        Ok(rows) => render(
            StatusCode::OK,
            "Search",
            user,
            None,
            html::search_page(&form.query, &[], Some(rows.as_slice())),
        ),
        Err(AppError::Validation(errors)) => render(
            StatusCode::BAD_REQUEST,
            "Search",
            user,
            None,
            html::search_page(&form.query, &errors, None),
        ),
        Err(e) => error_page(e, user),
    }
}

#[instrument(skip(state, identity))]
pub async fn snippets_page(State(state): State<AppState>, identity: MaybeUser) -> Response {
    let user = identity.user.as_ref();
    match state.snippets.list().await {
        Ok(rows) => render(StatusCode::OK, "Snippets", user, None, html::snippets_page(&rows)),
        Err(e) => error_page(e, user),
    }
}

pub async fn submit_page(identity: MaybeUser) -> Response {
    render(
        StatusCode::OK,
        "Submit",
        identity.user.as_ref(),
        None,
        html::submit_form(&SnippetFields::default(), &[]),
    )
}

#[instrument(skip(state, identity, form))]
pub async fn submit_snippet(
    State(state): State<AppState>,
    identity: MaybeUser,
    Form(form): Form<SnippetFields>,
) -> Response {
    let user = identity.user.as_ref();
    match state.snippets.create(form.clone(), user.map(|u| u.id)).await {
        Ok(id) => Redirect::to(&format!("/snippet/{id}?notice=created")).into_response(),
        Err(AppError::Validation(errors)) => render(
            StatusCode::BAD_REQUEST,
            "Submit",
            user,
            None,
            html::submit_form(&form, &errors),
        ),
        Err(e) => error_page(e, user),
    }
}

#[instrument(skip(state, identity))]
pub async fn snippet_page(
    State(state): State<AppState>,
    identity: MaybeUser,
    Path(id): Path<String>,
    Query(q): Query<NoticeQuery>,
) -> Response {
    let user = identity.user.as_ref();
    let found = match parse_id(&id) {
        Ok(id) => state.snippets.get_by_id(id).await,
        Err(e) => Err(e),
    };
    match found {
        Ok(snippet) => render(
            StatusCode::OK,
            &snippet.title,
            user,
            q.text(),
            html::snippet_detail(&snippet),
        ),
        Err(e) => error_page(e, user),
    }
}
