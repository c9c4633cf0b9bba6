//! Extension folioserver pour le compteur de visites
//!
//! `GET /api/visitor-count` incrémente le compteur partagé à la première
//! visite d'un navigateur, puis pose un cookie marqueur valable 24 heures.
//! Tant que le cookie est présent, la route se contente de lire le compteur.

use crate::config_ext::CounterConfigExt;
use crate::store::{CounterStore, UpstashStore};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
    routing::get,
};
use folioconfig::Config;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

/// Clé du compteur dans le store
pub const VISITOR_KEY: &str = "portfolio_visitors";

/// Nom du cookie marqueur
pub const COOKIE_NAME: &str = "visitor_counted";

/// Durée de vie du cookie marqueur (24 heures)
pub const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24;

/// État partagé pour l'API de comptage
#[derive(Clone, Debug)]
pub struct VisitorState {
    store: Option<Arc<dyn CounterStore>>,
    secure_cookies: bool,
}

impl VisitorState {
    pub fn new(store: Arc<dyn CounterStore>, secure_cookies: bool) -> Self {
        Self {
            store: Some(store),
            secure_cookies,
        }
    }

    /// État sans store : la route répond toujours zéro
    pub fn unconfigured() -> Self {
        Self {
            store: None,
            secure_cookies: false,
        }
    }

    /// Valeur de l'en-tête `Set-Cookie` du marqueur
    fn marker_cookie(&self) -> String {
        let mut cookie = format!(
            "{}=true; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            COOKIE_NAME, COOKIE_MAX_AGE_SECS
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Cherche la paire `visitor_counted=true` dans les en-têtes `Cookie`
///
/// Les valeurs sont lues octet par octet : un cookie voisin non ASCII ne
/// doit pas masquer le marqueur.
fn has_marker(headers: &HeaderMap) -> bool {
    let marker = format!("{}=true", COOKIE_NAME);
    headers
        .get_all(header::COOKIE)
        .iter()
        .flat_map(|value| value.as_bytes().split(|b| *b == b';'))
        .any(|pair| pair.trim_ascii() == marker.as_bytes())
}

/// Réponse du compteur
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VisitorCount {
    pub count: u64,
    /// Présent quand le store a répondu
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incremented: Option<bool>,
    /// Présent en mode dégradé (`count` vaut alors 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VisitorCount {
    fn counted(count: u64, incremented: bool) -> Self {
        Self {
            count,
            incremented: Some(incremented),
            error: None,
        }
    }

    fn degraded(error: &str) -> Self {
        Self {
            count: 0,
            incremented: None,
            error: Some(error.to_string()),
        }
    }
}

/// Compte la visite courante
#[utoipa::path(
    get,
    path = "/api/visitor-count",
    responses(
        (status = 200, description = "Compteur courant (0 avec `error` si le store est indisponible)", body = VisitorCount)
    ),
    tag = "visitors"
)]
pub async fn get_visitor_count(
    State(state): State<VisitorState>,
    headers: HeaderMap,
) -> Response {
    let Some(store) = state.store.as_ref() else {
        warn!("Visitor store not configured");
        return Json(VisitorCount::degraded("Redis not configured")).into_response();
    };

    if has_marker(&headers) {
        return match store.get(VISITOR_KEY).await {
            Ok(count) => Json(VisitorCount::counted(count.unwrap_or(0), false)).into_response(),
            Err(e) => {
                error!("Visitor count error: {}", e);
                Json(VisitorCount::degraded("Failed to fetch count")).into_response()
            }
        };
    }

    match store.incr(VISITOR_KEY).await {
        Ok(count) => (
            [(header::SET_COOKIE, state.marker_cookie())],
            Json(VisitorCount::counted(count, true)),
        )
            .into_response(),
        Err(e) => {
            error!("Visitor count error: {}", e);
            Json(VisitorCount::degraded("Failed to fetch count")).into_response()
        }
    }
}

/// Documentation OpenAPI pour le compteur de visites
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Visitor Counter API",
        version = "1.0.0",
        description = "Compteur de visites du site portfolio"
    ),
    paths(get_visitor_count),
    components(schemas(VisitorCount)),
    tags(
        (name = "visitors", description = "Compteur de visites")
    )
)]
pub struct VisitorsApiDoc;

/// Crée le router pour l'API de comptage
pub fn create_api_router(state: VisitorState) -> Router {
    Router::new()
        .route("/api/visitor-count", get(get_visitor_count))
        .with_state(state)
}

/// Trait d'extension pour folioserver::Server
pub trait VisitorsServerExt {
    /// Initialise l'API de comptage
    ///
    /// # Routes créées
    ///
    /// - `GET /api/visitor-count`
    /// - Swagger: `/swagger-ui/visitors`
    async fn init_visitors(&mut self, config: &Config) -> anyhow::Result<VisitorState>;
}

impl VisitorsServerExt for folioserver::Server {
    async fn init_visitors(&mut self, config: &Config) -> anyhow::Result<VisitorState> {
        let state = match (
            config.get_visitors_store_url(),
            config.get_visitors_store_token(),
        ) {
            (Some(url), Some(token)) => {
                info!("Visitor counter enabled");
                let store = UpstashStore::new(url, token, config.get_upstream_timeout())?;
                VisitorState::new(Arc::new(store), config.get_secure_cookies())
            }
            _ => {
                warn!("Visitor store not configured, the counter will stay at 0");
                VisitorState::unconfigured()
            }
        };

        self.add_openapi(create_api_router(state.clone()), VisitorsApiDoc::openapi(), "visitors")
            .await;

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NoStore;

    #[async_trait::async_trait]
    impl CounterStore for NoStore {
        async fn incr(&self, _key: &str) -> crate::Result<u64> {
            Ok(1)
        }

        async fn get(&self, _key: &str) -> crate::Result<Option<u64>> {
            Ok(None)
        }
    }

    #[test]
    fn test_marker_cookie() {
        let state = VisitorState::new(Arc::new(NoStore), false);
        assert_eq!(
            state.marker_cookie(),
            "visitor_counted=true; Max-Age=86400; Path=/; HttpOnly; SameSite=Lax"
        );

        let state = VisitorState::new(Arc::new(NoStore), true);
        assert!(state.marker_cookie().ends_with("; Secure"));
    }

    #[test]
    fn test_has_marker() {
        let mut headers = HeaderMap::new();
        assert!(!has_marker(&headers));

        headers.append(header::COOKIE, "theme=dark".parse().unwrap());
        assert!(!has_marker(&headers));

        headers.append(header::COOKIE, "a=1;visitor_counted=true ;b=2".parse().unwrap());
        assert!(has_marker(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "xvisitor_counted=true".parse().unwrap());
        assert!(!has_marker(&headers));
    }

    #[test]
    fn test_degraded_body() {
        assert_eq!(
            serde_json::to_value(VisitorCount::degraded("Redis not configured")).unwrap(),
            serde_json::json!({"count": 0, "error": "Redis not configured"})
        );
    }
}
