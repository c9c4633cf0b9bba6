//! # foliospotify - Spotify "now playing" for the Folio server
//!
//! `foliospotify` answers one question for the portfolio site: what is the
//! owner listening to right now? It exchanges a long-lived refresh credential
//! for an access token, asks for the live playback, and falls back to the most
//! recently played track.
//!
//! ## Features
//!
//! - **Token exchange**: refresh-token grant with HTTP Basic client credentials
//! - **Aggregation**: live playback, then listening history, then idle
//! - **HTTP API**: `GET /api/now-playing`, never cached by browsers
//! - **Setup helper**: authorization URL and code exchange to obtain the
//!   refresh credential once (see the `spotify_token` binary)
//!
//! ## Quick Start
//!
//! ```no_run
//! use foliospotify::SpotifyClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SpotifyClient::builder()
//!         .credentials("client-id", "client-secret")
//!         .refresh_token("refresh-token")
//!         .build()?;
//!
//!     let status = client.now_playing().await?;
//!     match &status.track {
//!         Some(track) => println!("{} - {}", track.artist, track.title),
//!         None => println!("Nothing playing"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;
pub mod server_ext;

pub use client::{ClientBuilder, SpotifyClient};
pub use config_ext::SpotifyConfigExt;
pub use error::{Result, SpotifyError};
pub use models::{PlaybackStatus, PlayingTrack, TokenResponse, Track};
pub use server_ext::{NowPlayingState, SpotifyApiDoc, SpotifyServerExt, create_api_router};
