//! Obtention du refresh token Spotify (à lancer une seule fois)
//!
//! Usage : `cargo run --bin spotify_token [config_dir]`
//!
//! Le client id et le secret sont lus dans la configuration (ou dans
//! `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET`). L'outil affiche l'URL
//! d'autorisation, attend le `code` renvoyé sur l'URI de redirection et
//! l'échange contre un refresh token.

use anyhow::{Context, bail};
use folioconfig::Config;
use foliospotify::{SpotifyClient, SpotifyConfigExt};
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_dir = std::env::args().nth(1).unwrap_or_default();
    let config = Config::load_config(&config_dir)?;

    let client_id = config
        .get_spotify_client_id()
        .context("SPOTIFY_CLIENT_ID is not set")?;
    let client_secret = config
        .get_spotify_client_secret()
        .context("SPOTIFY_CLIENT_SECRET is not set")?;
    let redirect_uri = config.get_spotify_redirect_uri();

    let client = SpotifyClient::builder()
        .credentials(client_id.clone(), client_secret.clone())
        .timeout(config.get_upstream_timeout())
        .build()?;

    println!("\n🎵 Spotify Authorization Helper\n");
    println!("1. Open this URL in your browser:\n");
    println!("{}\n", client.authorize_url(&redirect_uri)?);
    println!("2. After authorizing, you will be redirected to a URL like:");
    println!("   {}?code=XXXXX\n", redirect_uri);
    println!("3. Copy the \"code\" parameter from that URL and paste it below.\n");

    print!("Enter the code: ");
    io::stdout().flush()?;

    let mut code = String::new();
    io::stdin().lock().read_line(&mut code)?;
    let code = code.trim();
    if code.is_empty() {
        bail!("No code provided");
    }

    let token = client.exchange_code(code, &redirect_uri).await?;
    let Some(refresh_token) = token.refresh_token else {
        bail!("Spotify answered without a refresh_token");
    };

    println!("\n✅ Success! Add these to your environment:\n");
    println!("SPOTIFY_CLIENT_ID={}", client_id);
    println!("SPOTIFY_CLIENT_SECRET={}", client_secret);
    println!("SPOTIFY_REFRESH_TOKEN={}\n", refresh_token);

    Ok(())
}
