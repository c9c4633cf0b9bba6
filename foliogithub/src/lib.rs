//! # foliogithub - GitHub token diagnostic
//!
//! The portfolio front-end reads the owner's contribution calendar and latest
//! commits with a GitHub personal access token. `GET /api/test-token` tells
//! whether that token is accepted by the REST and GraphQL APIs.

pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;
pub mod server_ext;

pub use client::{ClientBuilder, GithubClient};
pub use config_ext::GithubConfigExt;
pub use error::{GithubError, Result};
pub use models::TokenCheck;
pub use server_ext::{GithubApiDoc, GithubServerExt, GithubState, create_api_router};
