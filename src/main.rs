use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use school_forum::{
    api,
    config::Settings,
    db,
    seed,
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "school_forum=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting school forum on {}:{}", settings.server.host, settings.server.port);

    // Initialize database and run migrations
    let db_pool = db::connect(&settings.database).await?;

    let service_context = Arc::new(ServiceContext::new(db_pool, &settings));

    if settings.bootstrap.seed_on_startup {
        let report = seed::ensure_baseline(
            service_context.user_repo.as_ref(),
            service_context.post_repo.as_ref(),
        ).await?;
        if report.is_empty() {
            tracing::info!("Seed data already present");
        }
    }

    let expired = service_context.auth_service.cleanup_expired_sessions().await?;
    if expired > 0 {
        tracing::info!("Removed {} expired sessions", expired);
    }

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
