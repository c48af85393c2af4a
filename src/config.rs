//! Configuration module for the authentication service.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::auth::{AuthPolicy, HashParams, TokenConfig};
use crate::{AuthServiceError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty means any origin without credentials.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Derive the client key from `X-Forwarded-For` / `X-Real-IP`.
    ///
    /// Only enable this behind a reverse proxy that overwrites those headers,
    /// otherwise clients can pick their own rate-limiting identity.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            trust_proxy_headers: false,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL.
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_url() -> String {
    "sqlite://data/auth.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/auth-service.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Login policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Failed attempts per client before logins are refused.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// How long a client stays blocked after its latest failure.
    #[serde(default = "default_block_window")]
    pub block_window_secs: u64,
    /// TTL of the cached session record.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Deadline for each user store and cache call.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_block_window() -> u64 {
    15 * 60
}

fn default_session_ttl() -> u64 {
    24 * 60 * 60
}

fn default_call_timeout() -> u64 {
    3000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            block_window_secs: default_block_window(),
            session_ttl_secs: default_session_ttl(),
            call_timeout_ms: default_call_timeout(),
        }
    }
}

/// Argon2id parameters used when hashing new passwords.
#[derive(Debug, Clone, Deserialize)]
pub struct Argon2Config {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Time cost (iterations).
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
    /// Salt length in bytes.
    #[serde(default = "default_salt_length")]
    pub salt_length: usize,
    /// Digest length in bytes.
    #[serde(default = "default_key_length")]
    pub key_length: usize,
}

fn default_memory_kib() -> u32 {
    64 * 1024
}

fn default_iterations() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    4
}

fn default_salt_length() -> usize {
    16
}

fn default_key_length() -> usize {
    32
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
            salt_length: default_salt_length(),
            key_length: default_key_length(),
        }
    }
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HMAC signing secret (must be set).
    #[serde(default)]
    pub secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_jwt_expiry")]
    pub expiry_secs: u64,
}

fn default_jwt_expiry() -> u64 {
    24 * 60 * 60
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expiry_secs: default_jwt_expiry(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Login policy.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Password hashing parameters.
    #[serde(default)]
    pub argon2: Argon2Config,
    /// Token signing.
    #[serde(default)]
    pub jwt: JwtConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AuthServiceError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AuthServiceError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `AUTH_JWT_SECRET`: JWT signing secret
    /// - `AUTH_JWT_EXPIRY_SECS`: token lifetime in seconds
    /// - `AUTH_DATABASE_URL`: sqlx connection URL
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = non_empty_env("AUTH_JWT_SECRET") {
            self.jwt.secret = secret;
        }
        if let Some(expiry) = non_empty_env("AUTH_JWT_EXPIRY_SECS") {
            match expiry.parse() {
                Ok(secs) => self.jwt.expiry_secs = secs,
                Err(_) => tracing::warn!(value = %expiry, "Ignoring invalid AUTH_JWT_EXPIRY_SECS"),
            }
        }
        if let Some(url) = non_empty_env("AUTH_DATABASE_URL") {
            self.database.url = url;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the JWT secret is not set
    /// - `max_attempts` is zero
    /// - a window, TTL or token lifetime is zero or longer than a year
    /// - `call_timeout_ms` is zero
    /// - the Argon2 parameters would be rejected by the KDF
    pub fn validate(&self) -> Result<()> {
        if self.jwt.secret.is_empty() {
            return Err(AuthServiceError::Config(
                "jwt.secret is not set. \
                 Set it in config.toml or via the AUTH_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.auth.max_attempts == 0 {
            return Err(AuthServiceError::Config(
                "auth.max_attempts must be at least 1".to_string(),
            ));
        }
        check_secs("auth.block_window_secs", self.auth.block_window_secs)?;
        check_secs("auth.session_ttl_secs", self.auth.session_ttl_secs)?;
        check_secs("jwt.expiry_secs", self.jwt.expiry_secs)?;
        if self.auth.call_timeout_ms == 0 {
            return Err(AuthServiceError::Config(
                "auth.call_timeout_ms must be at least 1".to_string(),
            ));
        }
        self.hash_params()
            .check()
            .map_err(|e| AuthServiceError::Config(format!("argon2: {e}")))?;
        Ok(())
    }

    /// Password hashing parameters for [`crate::auth::Argon2Hasher`].
    pub fn hash_params(&self) -> HashParams {
        HashParams {
            memory_kib: self.argon2.memory_kib,
            iterations: self.argon2.iterations,
            parallelism: self.argon2.parallelism,
            salt_length: self.argon2.salt_length,
            key_length: self.argon2.key_length,
        }
    }

    /// Login policy for [`crate::auth::AuthService`].
    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy {
            max_attempts: i64::from(self.auth.max_attempts),
            block_window: Duration::from_secs(self.auth.block_window_secs),
            session_ttl: Duration::from_secs(self.auth.session_ttl_secs),
            call_timeout: Duration::from_millis(self.auth.call_timeout_ms),
        }
    }

    /// Signing settings for [`crate::auth::TokenManager`].
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt.secret.clone(),
            lifetime: Duration::from_secs(self.jwt.expiry_secs),
        }
    }
}

/// Upper bound for every configured window and TTL.
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

fn check_secs(name: &str, secs: u64) -> Result<()> {
    if secs == 0 || secs > MAX_TTL_SECS {
        return Err(AuthServiceError::Config(format!(
            "{name} must be between 1 and {MAX_TTL_SECS} seconds, got {secs}"
        )));
    }
    Ok(())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.cors_origins.is_empty());
        assert!(!config.server.trust_proxy_headers);

        assert_eq!(config.database.url, "sqlite://data/auth.db");
        assert_eq!(config.database.max_connections, 5);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/auth-service.log");

        assert_eq!(config.auth.max_attempts, 5);
        assert_eq!(config.auth.block_window_secs, 900);
        assert_eq!(config.auth.session_ttl_secs, 86400);
        assert_eq!(config.auth.call_timeout_ms, 3000);

        assert_eq!(config.argon2.memory_kib, 65536);
        assert_eq!(config.argon2.iterations, 3);
        assert_eq!(config.argon2.parallelism, 4);
        assert_eq!(config.argon2.salt_length, 16);
        assert_eq!(config.argon2.key_length, 32);

        assert!(config.jwt.secret.is_empty());
        assert_eq!(config.jwt.expiry_secs, 86400);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
cors_origins = ["http://localhost:5173"]
trust_proxy_headers = true

[database]
url = "postgres://admin@localhost/qontrol"
max_connections = 10

[logging]
level = "debug"
file = "custom/auth.log"

[auth]
max_attempts = 3
block_window_secs = 60
session_ttl_secs = 3600
call_timeout_ms = 500

[argon2]
memory_kib = 19456
iterations = 2
parallelism = 1
salt_length = 32
key_length = 64

[jwt]
secret = "super-secret"
expiry_secs = 7200
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert!(config.server.trust_proxy_headers);
        assert_eq!(config.database.url, "postgres://admin@localhost/qontrol");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.auth.max_attempts, 3);
        assert_eq!(config.argon2.memory_kib, 19456);
        assert_eq!(config.argon2.key_length, 64);
        assert_eq!(config.jwt.secret, "super-secret");
        assert_eq!(config.jwt.expiry_secs, 7200);

        let policy = config.auth_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.block_window, Duration::from_secs(60));
        assert_eq!(policy.session_ttl, Duration::from_secs(3600));
        assert_eq!(policy.call_timeout, Duration::from_millis(500));

        let token = config.token_config();
        assert_eq!(token.lifetime, Duration::from_secs(7200));
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[auth]
max_attempts = 10
"#;
        let config = Config::parse(toml).unwrap();

        assert_eq!(config.auth.max_attempts, 10);
        assert_eq!(config.auth.block_window_secs, 900);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.argon2.memory_kib, 65536);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(AuthServiceError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[jwt]\nsecret = \"from-file\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.jwt.secret, "from-file");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");

        assert!(result.is_err());
        assert!(matches!(result, Err(AuthServiceError::Io(_))));
    }

    // All env override cases share one test so they never race on the same variables.
    #[test]
    fn test_apply_env_overrides() {
        let original = std::env::var("AUTH_JWT_SECRET").ok();

        std::env::set_var("AUTH_JWT_SECRET", "env-secret-key");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.jwt.secret, "env-secret-key");

        std::env::set_var("AUTH_JWT_SECRET", "");
        let mut config = Config::default();
        config.jwt.secret = "original-secret".to_string();
        config.apply_env_overrides();
        assert_eq!(config.jwt.secret, "original-secret");

        // An unparsable lifetime is reported and skipped.
        std::env::set_var("AUTH_JWT_EXPIRY_SECS", "one-day");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.jwt.expiry_secs, default_jwt_expiry());
        std::env::remove_var("AUTH_JWT_EXPIRY_SECS");

        if let Some(val) = original {
            std::env::set_var("AUTH_JWT_SECRET", val);
        } else {
            std::env::remove_var("AUTH_JWT_SECRET");
        }
    }

    #[test]
    fn test_validate_missing_secret() {
        let config = Config::default();

        let result = config.validate();
        assert!(result.is_err());
        if let Err(AuthServiceError::Config(msg)) = result {
            assert!(msg.contains("jwt.secret"));
        }
    }

    #[test]
    fn test_validate_with_secret() {
        let mut config = Config::default();
        config.jwt.secret = "secret".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = Config::default();
        config.jwt.secret = "secret".to_string();
        config.auth.max_attempts = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_argon2_params() {
        let mut config = Config::default();
        config.jwt.secret = "secret".to_string();
        config.argon2.parallelism = 0;

        let result = config.validate();
        assert!(matches!(result, Err(AuthServiceError::Config(msg)) if msg.contains("argon2")));
    }

    #[test]
    fn test_validate_rejects_overflowing_window() {
        let config =
            Config::parse("[auth]\nblock_window_secs = 9223372036854775807\n[jwt]\nsecret = \"s\"")
                .unwrap();

        let result = config.validate();
        assert!(
            matches!(result, Err(AuthServiceError::Config(msg)) if msg.contains("auth.block_window_secs"))
        );
    }

    #[test]
    fn test_validate_window_and_ttl_bounds() {
        let base = || {
            let mut config = Config::default();
            config.jwt.secret = "secret".to_string();
            config
        };

        let mut config = base();
        config.auth.session_ttl_secs = MAX_TTL_SECS + 1;
        assert!(config.validate().is_err());

        let mut config = base();
        config.auth.block_window_secs = 0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.jwt.expiry_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = base();
        config.auth.block_window_secs = MAX_TTL_SECS;
        config.auth.session_ttl_secs = MAX_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_call_timeout() {
        let mut config = Config::default();
        config.jwt.secret = "secret".to_string();
        config.auth.call_timeout_ms = 0;

        let result = config.validate();
        assert!(matches!(result, Err(AuthServiceError::Config(msg)) if msg.contains("call_timeout_ms")));

        config.auth.call_timeout_ms = 1;
        assert!(config.validate().is_ok());
    }
}
