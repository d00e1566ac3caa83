use actix_middleware::{CorrelationIdMiddleware, JwtAuthMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use crypto_core::JwtSigner;
use newsletter_service::config::{Config, StoreBackend};
use newsletter_service::repository::Store;
use newsletter_service::{db, handlers, AppState, ServiceSettings};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,actix_web=info,sqlx=warn";

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

/// Newsletter Service
///
/// # Routes
///
/// - `/newsletter/api/v1/auth/*` - Registration, login, profile
/// - `/newsletter/api/v1/user/*` - User administration (admin only)
/// - `/newsletter/api/v1/post/*` - Posts, feeds, votes
/// - `/newsletter/api/v1/comment/*` - Threaded comments, votes
/// - `/newsletter/api/v1/search/*` - User and post search
/// - `/health`, `/ready`, `/metrics` - Operations
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.log.json);

    tracing::info!("Starting newsletter-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let signer = Arc::new(
        JwtSigner::new(&config.auth.jwt_secret, config.auth.jwt_expire_hours)
            .context("invalid JWT configuration")?,
    );

    let (store, pool) = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = db::init_pool().await?;
            tracing::info!("✅ Database pool ready, migrations applied");
            (Store::postgres(pool.clone()), Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            (Store::in_memory(), None)
        }
    };

    let state = web::Data::new(AppState::new(
        store,
        signer.clone(),
        ServiceSettings::from(&config),
        pool,
    ));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("✅ Listening on http://{}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware::new(signer.clone()))
            .wrap(CorrelationIdMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .shutdown_timeout(30)
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping server");
        handle.stop(true).await;
    });

    server.await.context("server error")?;
    tracing::info!("newsletter-service stopped");
    Ok(())
}
