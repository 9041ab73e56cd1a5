use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use parley::service::REQUIRED_PARTICIPANTS;
use parley::{CreateOutcome, Page, Thread};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ApiResult};
use crate::routes::{body_id, lenient_number, text_id, IdInput, PageQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateThreadRequest {
    #[serde(default)]
    #[schema(value_type = Option<Vec<i64>>)]
    pub participants: Option<Vec<IdInput>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateThreadRequest {
    #[serde(default)]
    #[schema(value_type = Option<Vec<i64>>)]
    pub participants: Option<Vec<IdInput>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponse {
    pub id: i64,
    pub participants: Vec<i64>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListThreadsQuery {
    /// Participant whose threads to list
    pub user_id: Option<String>,
    #[param(value_type = Option<u64>)]
    pub limit: Option<String>,
    #[param(value_type = Option<u64>)]
    pub offset: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListThreadsResponse {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub results: Vec<ThreadResponse>,
}

/// List every thread
#[utoipa::path(
    get,
    path = "/threads/",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of threads", body = ListThreadsResponse)
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<ListThreadsResponse>> {
    let Query(query) = query?;
    let page = state.config.pagination.page(
        lenient_number(query.limit.as_deref()),
        lenient_number(query.offset.as_deref()),
    );

    let threads = state.threads.list(page).await?;

    Ok(Json(page_to_response(threads, page.limit, page.offset)))
}

/// List threads a user participates in
#[utoipa::path(
    get,
    path = "/threads/list_for_user/",
    params(ListThreadsQuery),
    responses(
        (status = 200, description = "Page of threads", body = ListThreadsResponse),
        (status = 400, description = "Missing or non-integer user_id"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn list_for_user(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListThreadsQuery>, QueryRejection>,
) -> ApiResult<Json<ListThreadsResponse>> {
    let Query(query) = query?;
    let user_id = text_id("user_id", query.user_id.as_deref())?;
    let page = state.config.pagination.page(
        lenient_number(query.limit.as_deref()),
        lenient_number(query.offset.as_deref()),
    );

    let threads = state.threads.list_for_user(user_id, page).await?;

    Ok(Json(page_to_response(threads, page.limit, page.offset)))
}

/// Create a thread between two users, or return the one they already share
#[utoipa::path(
    post,
    path = "/threads/",
    request_body = CreateThreadRequest,
    responses(
        (status = 201, description = "Thread created", body = ThreadResponse),
        (status = 200, description = "Existing thread returned", body = ThreadResponse),
        (status = 400, description = "Wrong participant count or non-integer id"),
        (status = 404, description = "Participant not found")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateThreadRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let Json(req) = body?;
    let raw = req.participants.unwrap_or_default();
    if raw.len() != REQUIRED_PARTICIPANTS {
        return Err(ApiError::BadRequest(format!(
            "A thread must have exactly {} participants.",
            REQUIRED_PARTICIPANTS
        )));
    }
    let participants = resolve_participants(&state, &raw).await?;

    let (thread, outcome) = state.threads.create(&participants).await?;

    let status = match outcome {
        CreateOutcome::Created => StatusCode::CREATED,
        CreateOutcome::FoundExisting => StatusCode::OK,
    };
    Ok((status, Json(thread_to_response(thread))))
}

/// Get a specific thread by ID
#[utoipa::path(
    get,
    path = "/threads/{thread_id}/",
    params(
        ("thread_id" = i64, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Thread details", body = ThreadResponse),
        (status = 400, description = "Non-integer thread ID"),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread_id = text_id("thread_id", Some(&thread_id))?;
    let thread = state.threads.get(thread_id).await?;
    Ok(Json(thread_to_response(thread)))
}

/// Replace the participants of a thread
#[utoipa::path(
    patch,
    path = "/threads/{thread_id}/",
    params(
        ("thread_id" = i64, Path, description = "Thread ID")
    ),
    request_body = UpdateThreadRequest,
    responses(
        (status = 200, description = "Updated thread", body = ThreadResponse),
        (status = 400, description = "Invalid ids or more than two participants"),
        (status = 404, description = "Thread or participant not found")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    body: Result<Json<UpdateThreadRequest>, JsonRejection>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread_id = text_id("thread_id", Some(&thread_id))?;
    let Json(req) = body?;
    let raw = req
        .participants
        .ok_or_else(|| ApiError::BadRequest("participants is required.".to_string()))?;
    let participants = resolve_participants(&state, &raw).await?;

    let thread = state.threads.set_participants(thread_id, &participants).await?;
    Ok(Json(thread_to_response(thread)))
}

/// Replace the participants of a thread (full update)
#[utoipa::path(
    put,
    path = "/threads/{thread_id}/",
    params(
        ("thread_id" = i64, Path, description = "Thread ID")
    ),
    request_body = UpdateThreadRequest,
    responses(
        (status = 200, description = "Updated thread", body = ThreadResponse),
        (status = 400, description = "Invalid ids or more than two participants"),
        (status = 404, description = "Thread or participant not found")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn replace_thread(
    state: State<Arc<AppState>>,
    thread_id: Path<String>,
    body: Result<Json<UpdateThreadRequest>, JsonRejection>,
) -> ApiResult<Json<ThreadResponse>> {
    update_thread(state, thread_id, body).await
}

/// Delete a thread and its messages
#[utoipa::path(
    delete,
    path = "/threads/{thread_id}/",
    params(
        ("thread_id" = i64, Path, description = "Thread ID")
    ),
    responses(
        (status = 204, description = "Thread deleted"),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    let thread_id = text_id("thread_id", Some(&thread_id))?;
    state.threads.delete(thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Each id must be an integer naming an existing user, checked in order
async fn resolve_participants(state: &AppState, raw: &[IdInput]) -> ApiResult<Vec<i64>> {
    let mut participants = Vec::with_capacity(raw.len());
    for input in raw {
        let user_id = body_id("participant", input)?;
        state.threads.require_user(user_id).await?;
        participants.push(user_id);
    }
    Ok(participants)
}

pub(crate) fn thread_to_response(thread: Thread) -> ThreadResponse {
    ThreadResponse {
        id: thread.id,
        participants: thread.participants,
        created: thread.created,
        updated: thread.updated,
    }
}

fn page_to_response(page: Page<Thread>, limit: u64, offset: u64) -> ListThreadsResponse {
    ListThreadsResponse {
        total: page.total,
        limit,
        offset,
        results: page.items.into_iter().map(thread_to_response).collect(),
    }
}
