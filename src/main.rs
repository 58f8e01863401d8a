use hybridflow::config::ServerConfig;
use hybridflow::server::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local `.env` is optional; real environment variables take precedence.
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    eprintln!("HybridFlow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!("   Health: http://0.0.0.0:{}/health", config.port);
    eprintln!("   Salesforce login: {}", config.salesforce.login_url);
    eprintln!("   Slack API: {}\n", config.slack.api_url);

    let app = build_router(&config);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
