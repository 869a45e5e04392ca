//! MyMediWallet Auth Server
//!
//! HTTP entry point for the wallet authentication service: challenge
//! issuance, signed-challenge verification, and bearer-session endpoints
//! backed by in-memory stores.

use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::CorsLayer;

use mediwallet_auth::auth::{AuthService, ChallengeStore, SessionStore};
use mediwallet_auth::config::Config;
use mediwallet_auth::middleware::{self, RateLimiter};
use mediwallet_auth::routes;
use mediwallet_auth::state::AppState;

/// Rate-limit buckets idle beyond this are dropped by the sweeper.
const BUCKET_IDLE_MAX: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        challenge_ttl_seconds = config.challenge_ttl_seconds,
        session_ttl_seconds = config.session_ttl_seconds,
        "Starting MyMediWallet auth service"
    );

    // Build the stores and the service that owns them
    let auth_service = Arc::new(AuthService::new(
        ChallengeStore::new(config.challenge_ttl_seconds),
        SessionStore::new(config.session_ttl_seconds),
    ));

    let app_state = AppState::new(auth_service.clone());

    // Initialize rate limiter
    let rate_limiter = RateLimiter::new(config.rate_limit_rps);

    // Start expiry sweeper in background
    let sweeper_service = auth_service.clone();
    let sweeper_limiter = rate_limiter.clone();
    let sweep_interval = Duration::from_secs(config.sweep_interval_seconds as u64);
    tokio::spawn(async move {
        expiry_sweeper(sweeper_service, sweeper_limiter, sweep_interval).await;
    });

    let cors = configure_cors(&config);

    // Create the app router
    let rate_limiter_layer = rate_limiter.clone();
    let app = routes::api_router()
        .with_state(app_state)
        .layer(axum::middleware::from_fn(move |req, next| {
            let limiter = rate_limiter_layer.clone();
            middleware::rate_limit_layer(limiter)(req, next)
        }))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(axum::middleware::from_fn(middleware::security_headers));

    // HSTS only makes sense behind TLS
    let app = if config.environment.is_production() {
        app.layer(axum::middleware::from_fn(middleware::hsts_header))
    } else {
        app
    };

    let app = app.layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    tracing::info!("Server shutdown complete");
}

/// Background job dropping expired challenges, expired sessions, and idle
/// rate-limit buckets
async fn expiry_sweeper(
    auth_service: Arc<AuthService>,
    rate_limiter: RateLimiter,
    interval: Duration,
) {
    tracing::info!(interval_seconds = interval.as_secs(), "Starting expiry sweeper");

    loop {
        tokio::time::sleep(interval).await;

        let counts = auth_service.sweep_expired();
        let buckets_pruned = rate_limiter.prune_idle(BUCKET_IDLE_MAX);

        if counts.challenges_removed > 0 || counts.sessions_removed > 0 || buckets_pruned > 0 {
            tracing::debug!(
                challenges_removed = counts.challenges_removed,
                sessions_removed = counts.sessions_removed,
                buckets_pruned = buckets_pruned,
                "Expiry sweep completed"
            );
        }
    }
}

fn configure_cors(config: &Config) -> CorsLayer {
    let origins_raw = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default();

    if origins_raw.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins_raw
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
