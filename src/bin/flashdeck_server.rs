//! Flashdeck HTTP server entry point.

use std::sync::Arc;

use anyhow::Context;
use flashdeck::cache::SqliteStore;
use flashdeck::config::ServerConfig;
use flashdeck::service::FlashcardService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,flashdeck=debug")),
        )
        .init();

    let mut config = ServerConfig::from_env()?;

    // 命令行参数覆盖环境变量
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                config.bind_addr = args
                    .get(i + 1)
                    .context("--bind requires an address")?
                    .clone();
                i += 2;
            }
            "--port" | "-p" => {
                let raw = args.get(i + 1).context("--port requires a port number")?;
                config.port = raw
                    .parse()
                    .with_context(|| format!("Invalid port number: {}", raw))?;
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                print_help();
                anyhow::bail!("Unknown argument: {}", other);
            }
        }
    }
    config.validate()?;

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open cache at {}", config.db_path.display()))?;
    let provider = config
        .provider_builder()
        .build()
        .context("Failed to configure the Gemini provider")?;
    let service = Arc::new(FlashcardService::new(
        Arc::new(provider),
        Arc::new(store),
        config.service_config(),
    ));

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        %addr,
        db_path = %config.db_path.display(),
        single_flight = config.single_flight,
        fan_out_max_concurrency = config.fan_out_max_concurrency,
        "Starting flashdeck server"
    );

    flashdeck::server::serve(listener, service).await?;
    Ok(())
}

fn print_help() {
    println!("Flashdeck Server");
    println!();
    println!("USAGE:");
    println!("    flashdeck-server [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -b, --bind <ADDRESS>     Bind address [default: $FLASHDECK_BIND_ADDR or 127.0.0.1]");
    println!("    -p, --port <PORT>        Port number [default: $FLASHDECK_PORT or 8080]");
    println!("    -h, --help               Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    GEMINI_API_KEY           Provider API key (required)");
    println!("    FLASHDECK_DB_PATH        SQLite cache file [default: flashdeck.sqlite3]");
    println!("    RUST_LOG                 Log filter [default: info,flashdeck=debug]");
}
