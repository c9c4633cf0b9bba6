//! Extension pour lire la section `visitors` de folioconfig

use folioconfig::Config;

/// Trait d'extension pour la configuration du compteur de visites
///
/// L'URL et le jeton du store peuvent venir de `UPSTASH_REDIS_REST_URL` et
/// `UPSTASH_REDIS_REST_TOKEN`.
pub trait CounterConfigExt {
    fn get_visitors_store_url(&self) -> Option<String>;
    fn get_visitors_store_token(&self) -> Option<String>;

    /// Vrai si l'URL et le jeton sont renseignés
    fn is_visitors_store_configured(&self) -> bool {
        self.get_visitors_store_url().is_some() && self.get_visitors_store_token().is_some()
    }
}

impl CounterConfigExt for Config {
    fn get_visitors_store_url(&self) -> Option<String> {
        self.get_optional_string(&["visitors", "store", "url"])
    }

    fn get_visitors_store_token(&self) -> Option<String> {
        self.get_optional_string(&["visitors", "store", "token"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_configuration() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert!(!config.is_visitors_store_configured());

        let config =
            Config::from_yaml_str("visitors:\n  store:\n    url: https://db.upstash.io\n").unwrap();
        assert!(!config.is_visitors_store_configured());

        let config = Config::from_yaml_str(
            "visitors:\n  store:\n    url: https://db.upstash.io\n    token: secret\n",
        )
        .unwrap();
        assert!(config.is_visitors_store_configured());
        assert_eq!(config.get_visitors_store_token().as_deref(), Some("secret"));
    }
}
