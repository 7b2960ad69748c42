use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &parts_nexus::config::CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        proxy = %cfg.basic.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.basic.loglevel,
        digikey = cfg.digikey.enabled,
        tme = cfg.tme.enabled,
        arrow = cfg.arrow.enabled
    );

    let storage = parts_nexus::db::connect(&cfg.basic.database_url).await?;
    let http = parts_nexus::api::http::build_client(&cfg.basic)?;
    let suppliers = parts_nexus::Suppliers::from_config(cfg, http, storage)?;

    // Build axum router and serve
    let nexus_key: Arc<str> = Arc::from(cfg.basic.nexus_key.as_str());
    let state = parts_nexus::router::NexusState::new(suppliers, nexus_key);
    let app = parts_nexus::router::nexus_router(state);

    let listener = TcpListener::bind(&cfg.basic.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
