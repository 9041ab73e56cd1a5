use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use parley::{Message, Page, ServiceError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ApiResult};
use crate::routes::{body_id, lenient_number, text_id, IdInput, PageQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub sender: Option<IdInput>,
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub thread: Option<IdInput>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: i64,
    pub sender: i64,
    pub thread: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListMessagesResponse {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub results: Vec<MessageResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UnreadCountQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}

/// List every message, oldest first
#[utoipa::path(
    get,
    path = "/messages/",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of messages", body = ListMessagesResponse)
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<ListMessagesResponse>> {
    let Query(query) = query?;
    let page = state.config.pagination.page(
        lenient_number(query.limit.as_deref()),
        lenient_number(query.offset.as_deref()),
    );

    let messages = state.messages.list(page).await?;

    Ok(Json(page_to_response(messages, page.limit, page.offset)))
}

/// List messages in a thread, oldest first
#[utoipa::path(
    get,
    path = "/messages/thread/{thread_id}/messages/",
    params(
        ("thread_id" = i64, Path, description = "Thread ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of messages", body = ListMessagesResponse),
        (status = 400, description = "Non-integer thread ID"),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn list_for_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<ListMessagesResponse>> {
    let thread_id = text_id("thread_id", Some(&thread_id))?;
    let Query(query) = query?;
    let page = state.config.pagination.page(
        lenient_number(query.limit.as_deref()),
        lenient_number(query.offset.as_deref()),
    );

    let messages = state.messages.list_for_thread(thread_id, page).await?;

    Ok(Json(page_to_response(messages, page.limit, page.offset)))
}

/// Count unread messages across a user's threads
#[utoipa::path(
    get,
    path = "/messages/unread-count/",
    params(UnreadCountQuery),
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 400, description = "Missing or non-integer user_id"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UnreadCountQuery>, QueryRejection>,
) -> ApiResult<Json<UnreadCountResponse>> {
    let Query(query) = query?;
    let user_id = text_id("user_id", query.user_id.as_deref())?;

    let unread_count = state.messages.unread_count_for_user(user_id).await?;

    Ok(Json(UnreadCountResponse { unread_count }))
}

/// Get a specific message by ID
#[utoipa::path(
    get,
    path = "/messages/{message_id}/",
    params(
        ("message_id" = i64, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Message details", body = MessageResponse),
        (status = 400, description = "Non-integer message ID"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn get_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let message_id = text_id("message_id", Some(&message_id))?;
    let message = state.messages.get(message_id).await?;
    Ok(Json(message_to_response(message)))
}

/// Mark a message as read
#[utoipa::path(
    patch,
    path = "/messages/{message_id}/mark-as-read/",
    params(
        ("message_id" = i64, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Updated message", body = MessageResponse),
        (status = 404, description = "Message not found")
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    // A non-numeric id can never name a message
    let message_id = message_id
        .trim()
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Message {} not found.", message_id)))?;
    let message = state.messages.mark_as_read(message_id).await?;
    Ok(Json(message_to_response(message)))
}

/// Post a message into a thread
#[utoipa::path(
    post,
    path = "/messages/",
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message created", body = MessageResponse),
        (status = 400, description = "Invalid field or unknown sender/thread")
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let Json(req) = body?;
    let sender = req
        .sender
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("sender is required.".to_string()))
        .and_then(|id| body_id("sender", id))?;
    let thread = req
        .thread
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("thread is required.".to_string()))
        .and_then(|id| body_id("thread", id))?;
    let text = req
        .text
        .ok_or_else(|| ApiError::BadRequest("text is required.".to_string()))?;

    // Unknown references are field errors on this endpoint
    let message = state
        .messages
        .create(sender, thread, &text)
        .await
        .map_err(|err| match err {
            ServiceError::NotFound(msg) => ApiError::BadRequest(msg),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(message_to_response(message))))
}

fn message_to_response(message: Message) -> MessageResponse {
    MessageResponse {
        id: message.id,
        sender: message.sender,
        thread: message.thread,
        text: message.text,
        created: message.created,
        is_read: message.is_read,
    }
}

fn page_to_response(page: Page<Message>, limit: u64, offset: u64) -> ListMessagesResponse {
    ListMessagesResponse {
        total: page.total,
        limit,
        offset,
        results: page.items.into_iter().map(message_to_response).collect(),
    }
}
