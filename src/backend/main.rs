/**
 * PetCardio Server Entry Point
 *
 * This is the main entry point for the PetCardio backend server.
 * It loads the configuration and runs the Axum HTTP server until ctrl-c.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".to_string());
    eprintln!("[STARTUP] Setting RUST_LOG={}", env_filter);

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    tracing::info!("[STARTUP] Server initialization started");

    let config = petcardio::backend::server::config::load_config()?;
    tracing::info!(
        "[STARTUP] Source: {}, port: {}",
        config.source.as_str(),
        config.port
    );
    eprintln!("[STARTUP] Clients should connect to http://127.0.0.1:{}", config.port);

    petcardio::backend::server::init::run(config).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin petcardio-server --features ssr");
    std::process::exit(1);
}
