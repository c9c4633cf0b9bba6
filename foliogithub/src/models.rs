//! Token validation report

use serde::Serialize;
use utoipa::ToSchema;

/// Body of `GET /api/test-token`
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenCheck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_works: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphql_works: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Raw `x-oauth-scopes` header (classic tokens only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_scopes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl TokenCheck {
    /// No token configured
    pub fn missing() -> Self {
        Self {
            error: Some("GITHUB_TOKEN not found in environment variables".to_string()),
            hint: Some(
                "Set GITHUB_TOKEN in the environment or github.token in config.yaml".to_string(),
            ),
            ..Self::default()
        }
    }

    /// Token rejected by the REST API
    pub fn rejected(status: u16) -> Self {
        Self {
            error: Some(format!("GitHub API returned {}", status)),
            hint: Some("Token might be invalid or expired".to_string()),
            ..Self::default()
        }
    }

    /// Transport failure or unreadable answer
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Token accepted by the REST API
    pub fn valid(user: Option<String>, token_scopes: Option<String>, graphql_works: bool) -> Self {
        let hint = if graphql_works {
            "All systems operational"
        } else {
            "GraphQL has errors - check token permissions"
        };

        Self {
            success: true,
            user,
            token_works: Some(true),
            graphql_works: Some(graphql_works),
            message: Some("Token is valid and working!".to_string()),
            token_scopes,
            error: None,
            hint: Some(hint.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_report() {
        let value = serde_json::to_value(TokenCheck::missing()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "GITHUB_TOKEN not found in environment variables");
        assert!(value.get("user").is_none());
    }

    #[test]
    fn test_valid_report_uses_camel_case() {
        let report = TokenCheck::valid(Some("octocat".into()), Some("repo, read:user".into()), false);
        assert_eq!(
            serde_json::to_value(report).unwrap(),
            json!({
                "success": true,
                "user": "octocat",
                "tokenWorks": true,
                "graphqlWorks": false,
                "message": "Token is valid and working!",
                "tokenScopes": "repo, read:user",
                "hint": "GraphQL has errors - check token permissions"
            })
        );
    }
}
