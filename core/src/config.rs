//! Process-wide configuration.
//!
//! Read once at startup from environment variables (optionally loaded from
//! a `.env` file by the binary crate) and treated as read-only thereafter.

use std::env;

/// Runtime configuration for the execution engine and HTTP layer.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub llm_api_key: Option<String>,
    pub backend_cors_origins: Vec<String>,
    pub project_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./promptgraph.db".to_string(),
            secret_key: "a_very_default_secret_key_for_development_only".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 60 * 24 * 7,
            llm_api_key: None,
            backend_cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            project_name: "PromptGraph Backend".to_string(),
        }
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to
    /// [`Default`] values for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let access_token_expire_minutes = env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.access_token_expire_minutes);

        let backend_cors_origins = env::var("BACKEND_CORS_ORIGINS")
            .ok()
            .map(|v| {
                v.split(' ')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.backend_cors_origins);

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            secret_key: env::var("SECRET_KEY").unwrap_or(defaults.secret_key),
            algorithm: env::var("ALGORITHM").unwrap_or(defaults.algorithm),
            access_token_expire_minutes,
            llm_api_key: env::var("CLAUDE_API_KEY").ok(),
            backend_cors_origins,
            project_name: defaults.project_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.algorithm, "HS256");
        assert!(cfg.llm_api_key.is_none());
        assert_eq!(cfg.backend_cors_origins.len(), 2);
    }
}
