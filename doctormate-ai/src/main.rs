use doctormate_ai::{ServiceConfig, create_app};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize JSON tracing, or human-readable output with `LOG_FORMAT=pretty`
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "doctormate_ai=debug,doctormate_directory=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServiceConfig::from_env()?;
    let app = create_app(&config)?;

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    let addr = listener.local_addr()?;

    info!("DoctorMate AI starting on {}", addr);
    info!("Skin check endpoint: POST http://{}/ai/skin/check", addr);
    info!("Symptoms check endpoint: POST http://{}/ai/symptoms/check", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
