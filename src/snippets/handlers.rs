use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::dto::MessageResponse,
    error::{AppError, AppResult},
    session::MaybeUser,
    snippets::{
        dto::{CreatedSnippetResponse, SearchRequest, SnippetListResponse, SnippetResponse},
        repo_types::SnippetFields,
    },
    state::AppState,
};

pub fn snippet_routes() -> Router<AppState> {
    Router::new()
        .route("/search-results", post(search_snippets))
        .route("/snippets", get(list_snippets))
        .route("/submit-snippet", post(submit_snippet))
        .route(
            "/snippet/:id",
            get(get_snippet).put(update_snippet).delete(delete_snippet),
        )
}

/// Path ids that are not integers cannot name a snippet.
pub(crate) fn parse_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::NotFound("Snippet not found"))
}

#[instrument(skip(state))]
pub async fn search_snippets(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> AppResult<Json<SnippetListResponse>> {
    let snippets = state.snippets.search(&payload.query).await?;
    Ok(Json(SnippetListResponse { snippets }))
}

#[instrument(skip(state))]
pub async fn list_snippets(State(state): State<AppState>) -> AppResult<Json<SnippetListResponse>> {
    let snippets = state.snippets.list().await?;
    Ok(Json(SnippetListResponse { snippets }))
}

#[instrument(skip(state, identity, fields))]
pub async fn submit_snippet(
    State(state): State<AppState>,
    identity: MaybeUser,
    Json(fields): Json<SnippetFields>,
) -> AppResult<(
    StatusCode,
    [(header::HeaderName, String); 1],
    Json<CreatedSnippetResponse>,
)> {
    let owner = identity.user.as_ref().map(|u| u.id);
    let id = state.snippets.create(fields, owner).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/snippet/{id}"))],
        Json(CreatedSnippetResponse {
            message: "Snippet created successfully!",
            snippet_id: id,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SnippetResponse>> {
    let snippet = state.snippets.get_by_id(parse_id(&id)?).await?;
    Ok(Json(SnippetResponse { snippet }))
}

#[instrument(skip(state, fields))]
pub async fn update_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<SnippetFields>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    state.snippets.update(id, fields).await?;
    Ok(Json(MessageResponse {
        message: "Snippet updated successfully!",
    }))
}

#[instrument(skip(state))]
pub async fn delete_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.snippets.delete(parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Snippet deleted successfully!",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn anonymous() -> MaybeUser {
        MaybeUser {
            session: None,
            user: None,
        }
    }

    fn hello() -> SnippetFields {
        SnippetFields {
            title: "Hello".into(),
            code: "print(1)".into(),
            description: None,
            language: "python".into(),
        }
    }

    async fn submit(state: &AppState, fields: SnippetFields) -> i64 {
        let (status, _, Json(body)) =
            submit_snippet(State(state.clone()), anonymous(), Json(fields))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        body.snippet_id
    }

    #[tokio::test]
    async fn submit_then_fetch_anonymous_snippet() {
        let state = AppState::in_memory();
        let id = submit(&state, hello()).await;

        let Json(body) = get_snippet(State(state), Path(id.to_string()))
            .await
            .unwrap();
        assert_eq!(body.snippet.title, "Hello");
        assert_eq!(body.snippet.user_id, None);
    }

    #[tokio::test]
    async fn submit_attributes_logged_in_owner() {
        let state = AppState::in_memory();
        state.accounts.register("alice", "secret1", "secret1").await.unwrap();
        let alice = state.accounts.authenticate("alice", "secret1").await.unwrap();
        let identity = MaybeUser {
            session: None,
            user: Some(alice.clone()),
        };

        let (_, [(_, location)], Json(body)) =
            submit_snippet(State(state.clone()), identity, Json(hello()))
                .await
                .unwrap();
        assert_eq!(location, format!("/api/snippet/{}", body.snippet_id));

        let snippet = state.snippets.get_by_id(body.snippet_id).await.unwrap();
        assert_eq!(snippet.user_id, Some(alice.id));
        assert_eq!(snippet.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn submit_with_missing_fields_lists_field_errors() {
        let state = AppState::in_memory();
        let err = submit_snippet(State(state), anonymous(), Json(SnippetFields::default()))
            .await
            .err()
            .unwrap();
        match err {
            AppError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["title", "code", "language"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_and_malformed_ids_are_404() {
        let state = AppState::in_memory();
        for raw in ["999", "abc"] {
            let res = get_snippet(State(state.clone()), Path(raw.to_string()))
                .await
                .into_response();
            assert_eq!(res.status(), StatusCode::NOT_FOUND);

            let res = delete_snippet(State(state.clone()), Path(raw.to_string()))
                .await
                .into_response();
            assert_eq!(res.status(), StatusCode::NOT_FOUND);

            let res = update_snippet(State(state.clone()), Path(raw.to_string()), Json(hello()))
                .await
                .into_response();
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn update_and_delete_round() {
        let state = AppState::in_memory();
        let id = submit(&state, hello()).await;

        let mut changed = hello();
        changed.title = "Hello again".into();
        update_snippet(State(state.clone()), Path(id.to_string()), Json(changed))
            .await
            .unwrap();
        assert_eq!(
            state.snippets.get_by_id(id).await.unwrap().title,
            "Hello again"
        );

        let res = update_snippet(
            State(state.clone()),
            Path(id.to_string()),
            Json(SnippetFields::default()),
        )
        .await
        .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        delete_snippet(State(state.clone()), Path(id.to_string()))
            .await
            .unwrap();
        let res = get_snippet(State(state), Path(id.to_string()))
            .await
            .into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_and_list() {
        let state = AppState::in_memory();
        submit(&state, hello()).await;
        let mut other = hello();
        other.title = "Quicksort".into();
        submit(&state, other).await;

        let Json(found) = search_snippets(
            State(state.clone()),
            Json(SearchRequest {
                query: "HELL".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(found.snippets.len(), 1);

        let res = search_snippets(State(state.clone()), Json(SearchRequest { query: "".into() }))
            .await
            .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let Json(all) = list_snippets(State(state)).await.unwrap();
        assert_eq!(all.snippets[0].title, "Quicksort");
    }
}
