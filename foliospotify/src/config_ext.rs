//! Extension pour lire la section `spotify` de folioconfig
//!
//! ```rust,ignore
//! use foliospotify::SpotifyConfigExt;
//!
//! if config.is_spotify_configured() {
//!     let client = SpotifyClient::from_config(&config)?;
//! }
//! ```

use folioconfig::Config;

/// URI de redirection par défaut du flux authorization-code
const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/api/callback";

/// Trait d'extension pour la configuration Spotify
///
/// Les secrets peuvent venir du fichier ou des variables `SPOTIFY_CLIENT_ID`,
/// `SPOTIFY_CLIENT_SECRET` et `SPOTIFY_REFRESH_TOKEN`. Une valeur vide compte
/// comme absente.
pub trait SpotifyConfigExt {
    fn get_spotify_client_id(&self) -> Option<String>;
    fn get_spotify_client_secret(&self) -> Option<String>;
    fn get_spotify_refresh_token(&self) -> Option<String>;

    /// URI de redirection déclarée dans l'application Spotify
    fn get_spotify_redirect_uri(&self) -> String;

    /// Vrai si les trois secrets sont présents
    fn is_spotify_configured(&self) -> bool;
}

impl SpotifyConfigExt for Config {
    fn get_spotify_client_id(&self) -> Option<String> {
        self.get_optional_string(&["spotify", "client_id"])
    }

    fn get_spotify_client_secret(&self) -> Option<String> {
        self.get_optional_string(&["spotify", "client_secret"])
    }

    fn get_spotify_refresh_token(&self) -> Option<String> {
        self.get_optional_string(&["spotify", "refresh_token"])
    }

    fn get_spotify_redirect_uri(&self) -> String {
        self.get_optional_string(&["spotify", "redirect_uri"])
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string())
    }

    fn is_spotify_configured(&self) -> bool {
        self.get_spotify_client_id().is_some()
            && self.get_spotify_client_secret().is_some()
            && self.get_spotify_refresh_token().is_some()
    }
}
