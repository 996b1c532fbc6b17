use utoipa::OpenApi;

use crate::{handlers::stream, routes::health, routes::messages};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        stream::chat_stream,
        messages::list_messages,
    ),
    components(schemas(health::HealthResponse)),
    tags(
        (name = "health", description = "Service status"),
        (name = "chat", description = "Grounded answers over Server-Sent Events"),
        (name = "messages", description = "Persisted chat turns")
    ),
    info(title = "Docent API")
)]
pub struct ApiDoc;
