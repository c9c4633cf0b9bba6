//! # folioserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour monter les routes API du
//! site portfolio sur un serveur Axum.
//!
//! ## Fonctionnalités
//!
//! - **Routes JSON simples** : `add_route()` pour un endpoint GET qui renvoie du JSON
//! - **Sous-routers** : `add_router()` et `add_openapi()` (avec Swagger UI)
//! - **Front-end statique** : `add_static_dir()` sert un build déjà produit
//! - **Logs** : initialisation de `tracing`, niveau modifiable à chaud si
//!   `host.logger.admin_api` est actif
//! - **Arrêt gracieux** : gestion propre de Ctrl+C
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use folioserver::ServerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", "http://localhost", 3000).build();
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, init_logging};
pub use server::{Server, ServerBuilder, ServerInfo};
