use candidatura::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // a missing .env is fine; the environment may already be set
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("candidatura=debug,tower_http=debug")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        supabase_url = %config.supabase_url,
        bucket = %config.photo_bucket,
        photo_reference = ?config.photo_reference,
        "configuration loaded"
    );

    candidatura::server::serve(config).await?;
    Ok(())
}
