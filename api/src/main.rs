use apiserver::{
    server,
    settings::{startup_log_level, Settings},
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(about = "User registration and session API")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "configs/apiserver.toml")]
    config_path: String,
}

#[tokio::main]
async fn main() -> Result<(), server::BoxError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config_path);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(startup_log_level(&settings))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("failed to load config {}: {}", cli.config_path, e);
            return Err(e.into());
        }
    };

    if let Err(e) = server::start(settings).await {
        tracing::error!("error occurred: {}", e);
        return Err(e);
    }

    Ok(())
}
