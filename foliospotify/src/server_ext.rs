//! Extension folioserver pour le widget "now playing"
//!
//! Ce module expose `GET /api/now-playing` (et l'ancien alias `/api/spotify`)
//! et fournit un trait d'extension pour l'enregistrer sur un `folioserver::Server`.

use crate::config_ext::SpotifyConfigExt;
use crate::{PlaybackStatus, PlayingTrack, SpotifyClient};
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use folioconfig::Config;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

/// Le navigateur et les CDN ne doivent jamais garder une réponse
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// État partagé pour l'API now-playing
///
/// Sans client (Spotify non configuré), la route répond toujours "idle".
#[derive(Clone, Default)]
pub struct NowPlayingState {
    client: Option<Arc<SpotifyClient>>,
}

impl NowPlayingState {
    pub fn new(client: SpotifyClient) -> Self {
        Self {
            client: Some(Arc::new(client)),
        }
    }

    /// État sans client
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

/// Corps d'erreur
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Statut de lecture courant
#[utoipa::path(
    get,
    path = "/api/now-playing",
    responses(
        (status = 200, description = "Lecture en cours, dernier titre écouté, ou idle", body = PlaybackStatus),
        (status = 500, description = "Échange du refresh token impossible", body = ErrorResponse)
    ),
    tag = "spotify"
)]
pub async fn get_now_playing(State(state): State<NowPlayingState>) -> Response {
    let no_store = [(header::CACHE_CONTROL, NO_STORE)];

    let Some(client) = state.client else {
        return (no_store, Json(PlaybackStatus::idle())).into_response();
    };

    match client.now_playing().await {
        Ok(status) => (no_store, Json(status)).into_response(),
        Err(e) => {
            error!("Error fetching Spotify data: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                no_store,
                Json(ErrorResponse {
                    error: "Failed to fetch Spotify data".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Documentation OpenAPI pour l'API Spotify
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Now Playing API",
        version = "1.0.0",
        description = "Lecture Spotify en cours pour le site portfolio"
    ),
    paths(get_now_playing),
    components(schemas(PlaybackStatus, PlayingTrack, ErrorResponse)),
    tags(
        (name = "spotify", description = "Widget now playing")
    )
)]
pub struct SpotifyApiDoc;

/// Crée le router pour l'API now-playing
pub fn create_api_router(state: NowPlayingState) -> Router {
    Router::new()
        .route("/api/now-playing", get(get_now_playing))
        .route("/api/spotify", get(get_now_playing))
        .with_state(state)
}

/// Trait d'extension pour folioserver::Server
pub trait SpotifyServerExt {
    /// Initialise l'API now-playing
    ///
    /// # Routes créées
    ///
    /// - `GET /api/now-playing`
    /// - `GET /api/spotify` (alias)
    /// - Swagger: `/swagger-ui/spotify`
    ///
    /// Sans identifiants Spotify, les routes sont quand même montées et
    /// répondent `{"isPlaying": false}`.
    async fn init_spotify(&mut self, config: &Config) -> anyhow::Result<NowPlayingState>;
}

impl SpotifyServerExt for folioserver::Server {
    async fn init_spotify(&mut self, config: &Config) -> anyhow::Result<NowPlayingState> {
        let state = if config.is_spotify_configured() {
            info!("Spotify now-playing enabled");
            NowPlayingState::new(SpotifyClient::from_config(config)?)
        } else {
            warn!("Spotify credentials missing, now-playing will always report idle");
            NowPlayingState::unconfigured()
        };

        self.add_openapi(create_api_router(state.clone()), SpotifyApiDoc::openapi(), "spotify")
            .await;

        Ok(state)
    }
}
