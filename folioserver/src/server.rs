//! # Module Server - API de haut niveau pour Axum
//!
//! Ce module cache la composition du `Router` Axum derrière quelques méthodes
//! d'enregistrement. Les routes sont accumulées jusqu'à l'appel de
//! [`Server::start`], qui fige le router et lance l'écoute.

use crate::logs::{LogState, LogsApiDoc, create_logs_router, init_logging};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use folioconfig::Config;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Info serveur sérialisable
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct ServerInfo {
    pub name: String,
    pub base_url: String,
    pub http_port: u16,
}

/// Serveur principal
pub struct Server {
    name: String,
    base_url: String,
    http_port: u16,
    router: Arc<RwLock<Router>>,
    join_handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `base_url` - URL de base (ex: "http://localhost")
    /// * `http_port` - Port HTTP à écouter
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            router: Arc::new(RwLock::new(Router::new())),
            join_handle: None,
        }
    }

    /// Ajoute une route JSON dynamique
    ///
    /// La closure fournie est appelée à chaque requête GET sur `path`.
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// # use folioserver::Server;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", "http://localhost", 3000);
    /// server.add_route("/api/status", || async {
    ///     serde_json::json!({ "status": "online" })
    /// }).await;
    /// # }
    /// ```
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let f = Arc::new(f);
        let handler = move || {
            let f = f.clone();
            async move { Json(f().await) }
        };

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).route(path, get(handler));
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let mut r = self.router.write().await;

        *r = if path == "/" {
            std::mem::take(&mut *r).merge(sub_router)
        } else {
            let normalized = format!("/{}", path.trim_start_matches('/'));
            std::mem::take(&mut *r).nest(&normalized, sub_router)
        };
    }

    /// Ajoute une API documentée avec OpenAPI et Swagger UI
    ///
    /// Le `api_router` porte ses chemins complets (ex: `/api/now-playing`) et
    /// est fusionné à la racine. La documentation est servie sous :
    ///
    /// - `/swagger-ui/{name}` pour l'interface Swagger
    /// - `/api-docs/{name}.json` pour le document OpenAPI
    pub async fn add_openapi(
        &mut self,
        api_router: Router,
        openapi: utoipa::openapi::OpenApi,
        name: &str,
    ) {
        let swagger_path = format!("/swagger-ui/{}", name);
        let swagger_path_static: &'static str = Box::leak(swagger_path.into_boxed_str());

        let openapi_json_path = format!("/api-docs/{}.json", name);
        let openapi_json_path_static: &'static str = Box::leak(openapi_json_path.into_boxed_str());

        let swagger = SwaggerUi::new(swagger_path_static).url(openapi_json_path_static, openapi);

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(api_router).merge(swagger);
    }

    /// Sert un répertoire statique (build du front-end)
    ///
    /// Monté à la racine, le répertoire devient le fallback du serveur : les
    /// routes API gardent la priorité.
    pub async fn add_static_dir(&mut self, path: &str, dir: impl Into<PathBuf>) {
        let serve = ServeDir::new(dir.into());
        let mut r = self.router.write().await;

        *r = if path == "/" {
            std::mem::take(&mut *r).fallback_service(serve)
        } else {
            std::mem::take(&mut *r).nest_service(path, serve)
        };
    }

    /// Copie du router courant, telle que servie par [`Server::start`]
    ///
    /// Permet d'exercer les routes en mémoire, sans ouvrir de socket.
    pub async fn router(&self) -> Router {
        self.router
            .read()
            .await
            .clone()
            .layer(CatchPanicLayer::custom(panic_response))
    }

    /// Démarre le serveur HTTP
    ///
    /// Lance le serveur sur le port configuré et met en place la gestion
    /// de Ctrl+C pour un arrêt gracieux. Échoue si le port ne peut pas être
    /// ouvert.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!(
            "Server {} running at {}:{}",
            self.name, self.base_url, self.http_port
        );

        let router = self.router().await;
        self.join_handle = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                error!("HTTP server stopped with an error: {}", e);
            }
        }));

        Ok(())
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Récupère les infos du serveur
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            http_port: self.http_port,
        }
    }

    /// Initialise le système de logging
    ///
    /// L'API de réglage n'a pas d'authentification : elle n'est montée que si
    /// `host.logger.admin_api` est vrai. Routes enregistrées dans ce cas :
    ///
    /// - `GET /api/log_setup` - niveau courant
    /// - `POST /api/log_setup` - changement de niveau à chaud
    /// - `GET /swagger-ui/logs` - documentation
    pub async fn init_logging(&mut self, config: &Config) -> LogState {
        let log_state = init_logging(config);

        if config.get_log_admin_api() {
            warn!("Log admin API enabled on /api/log_setup (no authentication)");
            self.add_openapi(
                create_logs_router(log_state.clone()),
                LogsApiDoc::openapi(),
                "logs",
            )
            .await;
        }

        log_state
    }
}

/// Un handler qui panique répond 500 sans détail interne
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal server error" })),
    )
        .into_response()
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C reçu, arrêt gracieux");
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    base_url: String,
    http_port: u16,
}

impl ServerBuilder {
    /// Crée un nouveau builder
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
        }
    }

    /// Builder initialisé depuis la section `host` de la configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.get_server_name(),
            base_url: config.get_base_url(),
            http_port: config.get_http_port(),
        }
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        Server::new(self.name, self.base_url, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_add_route_serves_json() {
        let mut server = Server::new("Test", "http://localhost", 0);
        server
            .add_route("/api/status", || async { serde_json::json!({"status": "ok"}) })
            .await;

        let (status, body) = get_json(server.router().await, "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_add_router_nests_under_path() {
        let mut server = Server::new("Test", "http://localhost", 0);
        let sub = Router::new().route("/ping", get(|| async { Json("pong") }));
        server.add_router("v1", sub).await;

        let (status, body) = get_json(server.router().await, "/v1/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");

        let (status, _) = get_json(server.router().await, "/ping").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_log_setup_is_not_mounted_by_default() {
        let config = Config::from_yaml_str("host:\n  logger:\n    enable_console: false\n").unwrap();
        let mut server = ServerBuilder::from_config(&config).build();
        server.init_logging(&config).await;

        let (status, _) = get_json(server.router().await, "/api/log_setup").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let response = server
            .router()
            .await
            .oneshot(
                Request::post("/api/log_setup")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"level":"TRACE"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (status, _) = get_json(server.router().await, "/api-docs/logs.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_log_setup_is_mounted_when_enabled() {
        let config = Config::from_yaml_str(
            "host:\n  logger:\n    enable_console: false\n    admin_api: true\n",
        )
        .unwrap();
        let mut server = ServerBuilder::from_config(&config).build();
        server.init_logging(&config).await;

        let (status, body) = get_json(server.router().await, "/api/log_setup").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["available_levels"].is_array());
    }

    #[tokio::test]
    async fn test_panicking_handler_is_a_500() {
        let mut server = Server::new("Test", "http://localhost", 0);
        let sub = Router::new().route(
            "/api/boom",
            get(|| async {
                if true {
                    panic!("boom");
                }
                Json("unreachable")
            }),
        );
        server.add_router("/", sub).await;

        let (status, body) = get_json(server.router().await, "/api/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_builder_from_config() {
        let config = Config::from_yaml_str("host:\n  name: Folio-Test\n  http_port: 8123\n").unwrap();
        let server = ServerBuilder::from_config(&config).build();
        let info = server.info();
        assert_eq!(info.name, "Folio-Test");
        assert_eq!(info.http_port, 8123);
        assert_eq!(info.base_url, "http://localhost");
    }
}
