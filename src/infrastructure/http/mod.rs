pub mod request_id;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::controllers::{article::ArticleController, health::HealthController, task::TaskController};
use crate::infrastructure::config::Config;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the application router with every route and layer
pub fn build_router(
    config: &Config,
    health_controller: Arc<HealthController>,
    article_controller: Arc<ArticleController>,
    task_controller: Arc<TaskController>,
) -> Router {
    let health_routes = Router::new()
        .route("/health", get(HealthController::health))
        .route("/health/ready", get(HealthController::health_ready))
        .with_state(health_controller);

    // Upload route, with a body limit sized to the configured maximum
    let upload_routes = Router::new()
        .route("/upload", post(ArticleController::upload))
        .with_state(article_controller.clone())
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ));

    let article_routes = Router::new()
        .route("/api/articles", get(ArticleController::list_articles))
        .route(
            "/api/article/:id",
            get(ArticleController::get_article).delete(ArticleController::delete_article),
        )
        .route("/api/article/:id/progress", get(ArticleController::article_progress))
        .with_state(article_controller);

    let task_routes = Router::new()
        .route("/task_status/:task_id", get(TaskController::task_status))
        .route("/generate_audio", post(TaskController::generate_audio))
        .with_state(task_controller);

    Router::new()
        .merge(health_routes)
        .merge(upload_routes)
        .merge(article_routes)
        .merge(task_routes)
        .nest_service("/static", ServeDir::new(&config.audio_out_dir))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(config: Arc<Config>, app: Router) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
