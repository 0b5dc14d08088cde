use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forum_backend::{app, config::Config, platform::Supabase, state::AppState};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forum_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        supabase_url = %config.supabase_url,
        anon_key = %mask_secret(&config.supabase_anon_key),
        service_key = %mask_secret(&config.supabase_service_key),
        frontend_origins = ?config.frontend_origins,
        production = config.production,
        port = config.port,
        "Loaded configuration from environment/.env"
    );

    let client = Supabase::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
        config.supabase_service_key.clone(),
    )?;
    let state = AppState::from_supabase(client, config.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
