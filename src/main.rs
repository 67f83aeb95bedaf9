use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::config::Config;
use storefront::inflight::InflightTransitions;
use storefront::mailer::Mailer;
use storefront::state::AppState;
use storefront::{api, AppError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => Some(async_nats::connect(url).await?),
        None => None,
    };
    let mailer = if config.mail_attempted() {
        Some(
            Mailer::from_config(
                config.mail_api_url.clone(),
                config.mail_api_key.clone(),
                config.mail_sender.clone(),
            )
            .map_err(AppError::from)?,
        )
    } else {
        tracing::warn!("mail not configured; confirmation emails are disabled");
        None
    };

    let state = AppState {
        db,
        nats,
        mailer,
        inflight: InflightTransitions::new(),
        shipping_fee: config.shipping_fee,
    };
    let app = api::router(state);

    tracing::info!(port = config.port, "storefront listening");
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
