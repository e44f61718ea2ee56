use handson_sync::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handson_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    tracing::info!(url = %config.listing_url, db = %config.database_path.display(), "starting harvest");

    let summary = handson_sync::run(&config)?;
    println!(
        "Extracted {} events; inserted/updated {}, skipped {}",
        summary.extracted, summary.upserted, summary.skipped
    );
    Ok(())
}
