use axum::extract::MatchedPath;
use axum::http::header;
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::AuthState;
use crate::config::Config;
use crate::task::TaskState;

pub mod api;

/// OpenAPI documentation for the JSON API.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::api::v1::register_handler,
        crate::auth::api::v1::login_handler,
        crate::task::api::v1::list_tasks_handler,
        crate::task::api::v1::get_task_handler,
        crate::task::api::v1::create_task_handler,
        crate::task::api::v1::update_task_status_handler,
        crate::task::api::v1::delete_task_handler,
    ),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Tasks", description = "Owner-scoped task management")
    )
)]
struct ApiDoc;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    use axum::Router;

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let db = Arc::new(db);
    let auth_state = Arc::new(AuthState::from_config(&config, db.clone()));
    let task_state = Arc::new(TaskState { db });

    let api_router = api::create_api_router(auth_state, task_state);

    let app = Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([header::AUTHORIZATION]))
                .layer(TraceLayer::new_for_http().make_span_with(FilteredMakeSpan))
                .layer(CorsLayer::permissive()),
        );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

/// Custom span maker that filters sensitive data from credential-bearing
/// requests.
#[derive(Clone, Debug)]
pub struct FilteredMakeSpan;

impl<B> MakeSpan<B> for FilteredMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let uri = request.uri();
        let method = request.method();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        // For credential routes, create a span without sensitive data
        if uri.path() == "/api/v1/login" || uri.path() == "/api/v1/register" {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
                sensitive_route = true,
                // Explicitly omit headers and body for credential requests
            )
        } else {
            // For non-sensitive routes, use standard logging
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
            )
        }
    }
}
