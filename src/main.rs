use std::net::SocketAddr;
use std::sync::Arc;

use profit_advisor::config::ServerConfig;
use profit_advisor::funnel::FunnelMachine;
use profit_advisor::geo::GeoClient;
use profit_advisor::qualify::{DnsReachability, EmailQualifier};
use profit_advisor::routes::{ApiState, api_routes};
use profit_advisor::store::{LeadStore, LibSqlLeadStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env();

    eprintln!("📊 Profit Advisor v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Chat API: http://0.0.0.0:{}/api/chat", config.port);
    eprintln!("   Lead API: http://0.0.0.0:{}/api/lead", config.port);

    // ── Lead store ───────────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let store: Arc<dyn LeadStore> = Arc::new(
        LibSqlLeadStore::new_local(db_path).await.unwrap_or_else(|e| {
            eprintln!("Error: Failed to open database at {}: {}", config.db_path, e);
            std::process::exit(1);
        }),
    );
    eprintln!("   Database: {}", config.db_path);

    // ── Funnel machine ───────────────────────────────────────────────────
    let reachability = Arc::new(DnsReachability::new(config.dns_timeout));
    let machine = Arc::new(FunnelMachine::new(EmailQualifier::new(reachability)));

    // ── Geolocation (optional) ───────────────────────────────────────────
    let geo = config.geo_base_url.clone().map(|url| {
        eprintln!("   Geolocation: {url}");
        Arc::new(GeoClient::new(url))
    });
    if geo.is_none() {
        eprintln!("   Geolocation: disabled");
    }

    let app = api_routes(ApiState {
        machine,
        store,
        geo,
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Profit Advisor server started");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
