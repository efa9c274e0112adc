use tracing::info;

use dstack_editor::api::{self, AppState};
use dstack_editor::config::Settings;
use dstack_editor::github::GithubClient;
use dstack_editor::store::Store;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    tracing_subscriber::fmt::init();
    color_eyre::install()?;

    let settings = Settings::from_env();

    if let Some(parent) = settings.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Store::open(&settings.database_path)?;
    info!(path = %settings.database_path.display(), "sqlite store ready");

    let github = settings
        .github_client_secret
        .clone()
        .map(|secret| GithubClient::new(settings.github_client_id.clone(), secret));
    if github.is_none() {
        info!("GITHUB_CLIENT_SECRET not set, auth endpoints disabled");
    }

    let app = api::router(AppState { store, github });

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "dstack configuration server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
