//! Extension pour lire la section `github` de folioconfig

use folioconfig::Config;

/// Trait d'extension pour la configuration GitHub
pub trait GithubConfigExt {
    /// Token d'accès (`github.token` ou `GITHUB_TOKEN`)
    fn get_github_token(&self) -> Option<String>;
}

impl GithubConfigExt for Config {
    fn get_github_token(&self) -> Option<String> {
        self.get_optional_string(&["github", "token"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_token() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert!(config.get_github_token().is_none());

        let config = Config::from_yaml_str("github:\n  token: ghp_abc\n").unwrap();
        assert_eq!(config.get_github_token().as_deref(), Some("ghp_abc"));
    }
}
