use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::routes::{health, messages, threads};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        threads::list_threads,
        threads::list_for_user,
        threads::create_thread,
        threads::get_thread,
        threads::replace_thread,
        threads::update_thread,
        threads::delete_thread,
        messages::list_messages,
        messages::list_for_thread,
        messages::unread_count,
        messages::get_message,
        messages::mark_as_read,
        messages::create_message,
    ),
    components(schemas(
        health::HealthResponse,
        threads::CreateThreadRequest,
        threads::UpdateThreadRequest,
        threads::ThreadResponse,
        threads::ListThreadsResponse,
        messages::CreateMessageRequest,
        messages::MessageResponse,
        messages::ListMessagesResponse,
        messages::UnreadCountResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service status"),
        (name = "threads", description = "Two-party conversation threads"),
        (name = "messages", description = "Messages and read tracking"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/threads/",
            "/threads/list_for_user/",
            "/threads/{thread_id}/",
            "/messages/",
            "/messages/unread-count/",
            "/messages/{message_id}/",
            "/messages/{message_id}/mark-as-read/",
            "/messages/thread/{thread_id}/messages/",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
