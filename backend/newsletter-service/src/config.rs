/// Configuration management for Newsletter Service
///
/// All settings come from environment variables (a `.env` file is loaded by the
/// binary before this runs). Unset values fall back to defaults; values that are
/// set but unparsable are configuration errors.
use db_pool::env_utils::{env_or, parse_env_or};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum JWT secret length accepted when `APP_ENV=production`
const PRODUCTION_MIN_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Storage settings
    pub database: DatabaseConfig,
    /// Session token settings
    pub auth: AuthConfig,
    /// Comment tree settings
    pub comments: CommentConfig,
    /// Search settings
    pub search: SearchConfig,
    /// Logging settings
    pub log: LogConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, production, test)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// Which store implementation backs the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
}

/// Session token configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub jwt_expire_hours: i64,
    /// `token` cookie lifetime in days
    pub cookie_expire_days: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expire_hours", &self.jwt_expire_hours)
            .field("cookie_expire_days", &self.cookie_expire_days)
            .finish()
    }
}

/// Comment tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentConfig {
    /// Deepest allowed nesting level (root comments are depth 1)
    pub max_depth: i32,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum rows returned by user/post search
    pub result_limit: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Emit JSON log lines instead of the human-readable format
    pub json: bool,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            max_depth: crate::services::comments::MAX_COMMENT_DEPTH,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { result_limit: 50 }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = env_or("APP_ENV", "development");

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET environment variable not set".to_string())?;
        if app_env == "production" && jwt_secret.len() < PRODUCTION_MIN_SECRET_LEN {
            return Err(format!(
                "JWT_SECRET must be at least {} bytes in production",
                PRODUCTION_MIN_SECRET_LEN
            ));
        }

        let config = Config {
            app: AppConfig {
                env: app_env,
                host: env_or("APP_HOST", "0.0.0.0"),
                port: parse_env_or("PORT", 8080)?,
            },
            database: DatabaseConfig {
                backend: parse_env_or("STORE_BACKEND", StoreBackend::Postgres)?,
            },
            auth: AuthConfig {
                jwt_secret,
                jwt_expire_hours: parse_env_or("JWT_EXPIRE_HOURS", 720)?,
                cookie_expire_days: parse_env_or("JWT_COOKIE_EXPIRE_DAYS", 30)?,
            },
            comments: CommentConfig {
                max_depth: parse_env_or("COMMENT_MAX_DEPTH", CommentConfig::default().max_depth)?,
            },
            search: SearchConfig {
                result_limit: parse_env_or("SEARCH_RESULT_LIMIT", SearchConfig::default().result_limit)?,
            },
            log: LogConfig {
                json: env_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            },
        };

        if config.comments.max_depth < 1 {
            return Err("COMMENT_MAX_DEPTH must be at least 1".to_string());
        }
        if config.search.result_limit < 1 {
            return Err("SEARCH_RESULT_LIMIT must be at least 1".to_string());
        }
        if config.auth.cookie_expire_days < 1 {
            return Err("JWT_COOKIE_EXPIRE_DAYS must be at least 1".to_string());
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "APP_ENV",
        "APP_HOST",
        "PORT",
        "STORE_BACKEND",
        "JWT_SECRET",
        "JWT_EXPIRE_HOURS",
        "JWT_COOKIE_EXPIRE_DAYS",
        "COMMENT_MAX_DEPTH",
        "SEARCH_RESULT_LIMIT",
        "LOG_FORMAT",
    ];

    fn reset_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_apply_when_unset() {
        reset_env();
        std::env::set_var("JWT_SECRET", "config-test-secret-value");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.auth.jwt_expire_hours, 720);
        assert_eq!(config.auth.cookie_expire_days, 30);
        assert_eq!(config.comments.max_depth, 4);
        assert_eq!(config.search.result_limit, 50);
        assert!(!config.log.json);
        assert!(!config.is_production());

        reset_env();
    }

    #[test]
    #[serial]
    fn test_missing_secret_is_an_error() {
        reset_env();
        let err = Config::from_env().unwrap_err();
        assert!(err.contains("JWT_SECRET"));
    }

    #[test]
    #[serial]
    fn test_production_requires_long_secret() {
        reset_env();
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("JWT_SECRET", "too-short-for-prod");
        assert!(Config::from_env().is_err());

        std::env::set_var("JWT_SECRET", "a-production-secret-with-enough-bytes!!");
        let config = Config::from_env().unwrap();
        assert!(config.is_production());

        reset_env();
    }

    #[test]
    #[serial]
    fn test_overrides_are_parsed() {
        reset_env();
        std::env::set_var("JWT_SECRET", "config-test-secret-value");
        std::env::set_var("PORT", "9090");
        std::env::set_var("STORE_BACKEND", "memory");
        std::env::set_var("COMMENT_MAX_DEPTH", "6");
        std::env::set_var("LOG_FORMAT", "json");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 9090);
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.comments.max_depth, 6);
        assert!(config.log.json);

        reset_env();
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_are_rejected() {
        reset_env();
        std::env::set_var("JWT_SECRET", "config-test-secret-value");
        std::env::set_var("COMMENT_MAX_DEPTH", "deep");
        assert!(Config::from_env().is_err());

        std::env::set_var("COMMENT_MAX_DEPTH", "0");
        assert!(Config::from_env().is_err());

        reset_env();
    }

    #[test]
    fn test_debug_redacts_secret() {
        let auth = AuthConfig {
            jwt_secret: "super-secret".into(),
            jwt_expire_hours: 1,
            cookie_expire_days: 1,
        };
        assert!(!format!("{:?}", auth).contains("super-secret"));
    }
}
