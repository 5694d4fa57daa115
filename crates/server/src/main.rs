//! Fable server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use fable_api::{middleware::AppState, router as api_router};
use fable_common::Config;
use fable_core::{
    ChapterService, CommentService, EngagementService, FollowService, ModerationService,
    NotificationService, ProfileService, StoryService, UserService,
};
use fable_db::repositories::{
    BookmarkRepository, ChapterRepository, CommentRepository, FollowRepository, LabelRepository,
    LikeRepository, ModerationRepository, NotificationRepository, PostRepository,
    ProfileRepository, StoryRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fable=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting fable server...");

    let config = Config::load()?;

    let db = fable_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    fable_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let story_repo = StoryRepository::new(Arc::clone(&db));
    let chapter_repo = ChapterRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let bookmark_repo = BookmarkRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));
    let label_repo = LabelRepository::new(Arc::clone(&db));
    let moderation_repo = ModerationRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Initialize services
    let user_service = UserService::new(Arc::clone(&db), user_repo.clone());
    let profile_service = ProfileService::new(profile_repo, user_repo);
    let story_service = StoryService::new(
        Arc::clone(&db),
        story_repo.clone(),
        post_repo.clone(),
        label_repo,
        chapter_repo.clone(),
    );
    let chapter_service = ChapterService::new(
        Arc::clone(&db),
        chapter_repo,
        story_repo,
        post_repo,
    );
    let comment_service = CommentService::new(Arc::clone(&db), comment_repo);
    let engagement_service = EngagementService::new(Arc::clone(&db), like_repo, bookmark_repo);
    let follow_service = FollowService::new(Arc::clone(&db), follow_repo);
    let moderation_service = ModerationService::new(Arc::clone(&db), moderation_repo);
    let notification_service = NotificationService::new(notification_repo);

    let state = AppState {
        user_service,
        profile_service,
        story_service,
        chapter_service,
        comment_service,
        engagement_service,
        follow_service,
        moderation_service,
        notification_service,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            fable_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
