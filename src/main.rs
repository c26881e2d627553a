mod app;
mod auth;
mod chatbot;
mod config;
mod error;
mod extractors;
mod llm;
mod meals;
mod state;
mod store;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "chefbyte=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("starting chefbyte v{}", env!("CARGO_PKG_VERSION"));

    let state = state::AppState::init().await?;
    let (host, port) = (state.config.host.clone(), state.config.port);

    let app = app::build_app(state);
    app::serve(app, &host, port).await
}
