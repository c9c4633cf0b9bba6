//! Extension folioserver pour la vérification du token GitHub

use crate::config_ext::GithubConfigExt;
use crate::{GithubClient, TokenCheck};
use axum::{Json, Router, extract::State, routing::get};
use folioconfig::Config;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::OpenApi;

/// État partagé pour l'API GitHub
#[derive(Clone, Default)]
pub struct GithubState {
    client: Option<Arc<GithubClient>>,
}

impl GithubState {
    pub fn new(client: GithubClient) -> Self {
        Self {
            client: Some(Arc::new(client)),
        }
    }

    /// État sans token
    pub fn unconfigured() -> Self {
        Self::default()
    }
}

/// Vérifie que le token GitHub configuré est accepté
#[utoipa::path(
    get,
    path = "/api/test-token",
    responses(
        (status = 200, description = "Rapport de validation (succès ou échec)", body = TokenCheck)
    ),
    tag = "github"
)]
pub async fn get_test_token(State(state): State<GithubState>) -> Json<TokenCheck> {
    let Some(client) = state.client else {
        return Json(TokenCheck::missing());
    };

    match client.check_token().await {
        Ok(report) => Json(report),
        Err(e) => {
            error!("GitHub token check failed: {}", e);
            Json(TokenCheck::failed(e.to_string()))
        }
    }
}

/// Documentation OpenAPI pour l'API GitHub
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GitHub Token API",
        version = "1.0.0",
        description = "Diagnostic du token GitHub du site portfolio"
    ),
    paths(get_test_token),
    components(schemas(TokenCheck)),
    tags(
        (name = "github", description = "Vérification du token")
    )
)]
pub struct GithubApiDoc;

/// Crée le router pour l'API GitHub
pub fn create_api_router(state: GithubState) -> Router {
    Router::new()
        .route("/api/test-token", get(get_test_token))
        .with_state(state)
}

/// Trait d'extension pour folioserver::Server
pub trait GithubServerExt {
    /// Initialise l'API de diagnostic GitHub
    ///
    /// # Routes créées
    ///
    /// - `GET /api/test-token`
    /// - Swagger: `/swagger-ui/github`
    async fn init_github(&mut self, config: &Config) -> anyhow::Result<GithubState>;
}

impl GithubServerExt for folioserver::Server {
    async fn init_github(&mut self, config: &Config) -> anyhow::Result<GithubState> {
        let state = match config.get_github_token() {
            Some(token) => {
                info!("GitHub token check enabled");
                let client = GithubClient::builder(token)
                    .timeout(config.get_upstream_timeout())
                    .build()?;
                GithubState::new(client)
            }
            None => {
                warn!("GitHub token missing, /api/test-token will report it");
                GithubState::unconfigured()
            }
        };

        self.add_openapi(create_api_router(state.clone()), GithubApiDoc::openapi(), "github")
            .await;

        Ok(state)
    }
}
