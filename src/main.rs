// src/main.rs

// --- Imports ---
use classcheck::{db, state::AppState, web};
use axum::serve;
use chrono::FixedOffset;
use std::{env, net::SocketAddr};
use time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_cookies::{CookieManagerLayer, Key};
use tower_http::trace::TraceLayer;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging (tracing) ---
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                env::var("RUST_LOG")
                    .unwrap_or_else(|_| {
                        "classcheck=debug,tower_http=info,sqlx=warn,tower_sessions=info".into()
                    })
                    .into()
            }),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 starting classcheck server...");

    // --- Database ---
    let db_pool = match db::create_db_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("failed to initialize the database: {}", e);
            return Err(anyhow::anyhow!("failed to connect/migrate DB: {}", e));
        }
    };

    // --- Sessions ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("failed to create session store: {}", e))?;
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("failed to migrate session store: {}", e))?;

    // Background sweeper for expired sessions
    let session_store_clone = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = session_store_clone
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("session cleanup task failed: {:?}", e);
        }
    });

    let secret_key_string = env::var("SESSION_SECRET")
        .map_err(|e| anyhow::anyhow!("SESSION_SECRET environment variable not set: {}", e))?;
    if secret_key_string.len() < 64 {
        tracing::warn!("SESSION_SECRET is short, consider a longer random key");
    }
    let _key = Key::from(secret_key_string.as_bytes());

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));

    // --- Timezone (fixed offset, Asia/Manila by default) ---
    let offset_hours: i32 = env::var("TZ_OFFSET_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8);
    let tz = FixedOffset::east_opt(offset_hours * 3600)
        .ok_or_else(|| anyhow::anyhow!("invalid TZ_OFFSET_HOURS: {}", offset_hours))?;
    tracing::info!("schedule timezone: UTC{:+}", offset_hours);

    // --- Application state ---
    let app_state = AppState { db_pool, tz };

    // --- Listener ---
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid BIND_ADDR: {}", e))?;
    tracing::info!("📡 listening on http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind listener on {}: {}", addr, e);
            return Err(e.into());
        }
    };

    // --- Router and middleware layers ---
    let app = web::routes::create_router(app_state.clone()).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CookieManagerLayer::new())
            .layer(session_layer),
    );

    // --- Serve ---
    tracing::info!("ready to accept connections");
    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("fatal server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
