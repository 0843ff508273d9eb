use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use wellness_auth::{
    auth::{AuthService, PgUserRepository, TokenCodec},
    config::AppConfig,
    create_router, db, AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Wellness Auth API - Starting...");

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;

    let token_codec = Arc::new(TokenCodec::with_ttl(&config.jwt_secret, config.token_ttl_secs));
    let users = Arc::new(PgUserRepository::new(db_pool));
    let auth_service = Arc::new(AuthService::new(users, token_codec.clone()));

    let app = create_router(AppState::new(auth_service, token_codec));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Wellness Auth API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
