use folioconfig::Config;
use foliocounter::VisitorsServerExt;
use foliogithub::GithubServerExt;
use folioserver::{Server, ServerBuilder};
use foliospotify::SpotifyServerExt;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
struct AppInfo {
    name: String,
    version: &'static str,
}

/// Enregistre toutes les routes du site sur le serveur
async fn register_routes(server: &mut Server, config: &Config) -> anyhow::Result<()> {
    let name = config.get_server_name();
    server
        .add_route("/api/info", move || {
            let name = name.clone();
            async move {
                AppInfo {
                    name,
                    version: env!("CARGO_PKG_VERSION"),
                }
            }
        })
        .await;

    info!("🎵 Initializing Spotify now-playing API...");
    server.init_spotify(config).await?;

    info!("👥 Initializing visitor counter API...");
    server.init_visitors(config).await?;

    info!("🔑 Initializing GitHub token check API...");
    server.init_github(config).await?;

    // Le front-end passe en dernier : il sert de fallback aux routes API
    if let Some(dir) = config.get_static_dir() {
        if dir.is_dir() {
            info!("📁 Serving static front-end from {}", dir.display());
            server.add_static_dir("/", dir).await;
        } else {
            warn!("⚠️ Static directory {} not found, skipping", dir.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Répertoire de configuration optionnel en premier argument
    let config_dir = std::env::args().nth(1).unwrap_or_default();
    let config = Config::load_config(&config_dir)?;

    let mut server = ServerBuilder::from_config(&config).build();
    server.init_logging(&config).await;

    register_routes(&mut server, &config).await?;

    info!("🌐 Starting HTTP server...");
    server.start().await?;

    info!("✅ Folio is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
