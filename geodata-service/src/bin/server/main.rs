use std::net::IpAddr;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::JwtHandler;
use auth::RateLimiter;
use auth::SessionTokenService;
use geodata_service::config::Config;
use geodata_service::domain::api_key::service::ApiKeyService;
use geodata_service::domain::auth::service::AuthService;
use geodata_service::domain::password_reset::service::PasswordResetService;
use geodata_service::inbound::http::cookies::CookieSettings;
use geodata_service::inbound::http::router::create_router;
use geodata_service::inbound::http::router::HttpSettings;
use geodata_service::outbound::repositories::PostgresApiKeyRepository;
use geodata_service::outbound::repositories::PostgresPasswordResetRepository;
use geodata_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geodata_service=debug,auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "geodata-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        issuer = %config.jwt.issuer,
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let jwt_handler = JwtHandler::from_base64_pem(
        &config.jwt.private_key,
        &config.jwt.public_key,
        &config.jwt.issuer,
    )?;
    let sessions = SessionTokenService::new(jwt_handler, config.jwt.session_config()?);
    let authenticator = Arc::new(Authenticator::new(sessions)?);

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let api_key_repository = Arc::new(PostgresApiKeyRepository::new(pg_pool.clone()));
    let reset_repository = Arc::new(PostgresPasswordResetRepository::new(pg_pool));

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_repository),
        Arc::clone(&api_key_repository),
        Arc::clone(&authenticator),
    ));
    let api_key_service = Arc::new(ApiKeyService::new(api_key_repository));
    let password_reset_service = Arc::new(PasswordResetService::new(
        user_repository,
        reset_repository,
        authenticator,
        config.password_reset_config(),
    ));

    let rate_limiter = if config.rate_limit.enabled {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.limiter_config()));
        spawn_limiter_sweeper(Arc::clone(&limiter));
        tracing::info!(
            requests = config.rate_limit.requests,
            per_seconds = config.rate_limit.per_seconds,
            burst = config.rate_limit.burst,
            "Rate limiting enabled"
        );
        Some(limiter)
    } else {
        None
    };

    let settings = HttpSettings {
        rate_limiter,
        trust_forwarded_for: config.rate_limit.trust_forwarded_for,
        cookies: CookieSettings::from_config(&config.cookies),
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        auth_service,
        password_reset_service,
        api_key_service,
        settings,
    );

    axum::serve(
        http_listener,
        http_application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    tracing::info!("Server exited");

    Ok(())
}

fn spawn_limiter_sweeper(limiter: Arc<RateLimiter<IpAddr>>) {
    let period = limiter.config().idle_ttl.max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // First tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = limiter.sweep();
            if evicted > 0 {
                tracing::debug!(
                    evicted,
                    tracked = limiter.tracked_clients(),
                    "Rate limiter swept idle clients"
                );
            }
        }
    });
}
