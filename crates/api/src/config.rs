use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// JWT authentication configuration
    pub jwt: JwtAuthConfig,
    /// Invitation link behaviour
    #[serde(default)]
    pub invitations: InvitationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn to_pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Per-client requests per minute on the public invitation endpoints.
    /// Zero disables rate limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Send Strict-Transport-Security on every response.
    #[serde(default)]
    pub hsts_enabled: bool,

    /// Peers allowed to supply X-Forwarded-For / X-Real-IP.
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

impl SecurityConfig {
    /// Parsed trusted proxy addresses. Entries that fail to parse are skipped;
    /// `Config::validate` rejects them at startup.
    pub fn trusted_proxy_addrs(&self) -> Vec<IpAddr> {
        self.trusted_proxies
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// RSA private key in PEM format for signing tokens
    pub private_key: String,

    /// RSA public key in PEM format for verifying tokens
    pub public_key: String,

    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,

    /// Clock skew tolerance in seconds
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationsConfig {
    /// Public frontend URL used to build `invite_url` (e.g. https://app.example.com).
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_recent_redemptions_limit")]
    pub recent_redemptions_limit: i64,

    #[serde(default = "default_token_generation_attempts")]
    pub token_generation_attempts: u32,
}

impl Default for InvitationsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            recent_redemptions_limit: default_recent_redemptions_limit(),
            token_generation_attempts: default_token_generation_attempts(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    1_048_576
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    30
}
fn default_access_token_expiry() -> i64 {
    3600
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_recent_redemptions_limit() -> i64 {
    10
}
fn default_token_generation_attempts() -> u32 {
    10
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with SR__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SR").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration from embedded defaults plus overrides, without
    /// touching the file system or environment.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 1048576

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 0
            hsts_enabled = false
            trusted_proxies = []

            [jwt]
            private_key = "test-private-key"
            public_key = "test-public-key"
            access_token_expiry_secs = 3600
            leeway_secs = 30

            [invitations]
            base_url = "http://localhost:3000"
            recent_redemptions_limit = 10
            token_generation_attempts = 10
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "SR__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.jwt.private_key.is_empty() || self.jwt.public_key.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "SR__JWT__PRIVATE_KEY and SR__JWT__PUBLIC_KEY must be set".to_string(),
            ));
        }

        if let Some(bad) = self
            .security
            .trusted_proxies
            .iter()
            .find(|p| p.parse::<IpAddr>().is_err())
        {
            return Err(ConfigValidationError::InvalidValue(format!(
                "security.trusted_proxies contains an invalid IP address: {}",
                bad
            )));
        }

        let invitations = &self.invitations;
        if invitations.recent_redemptions_limit < 1 {
            return Err(ConfigValidationError::InvalidValue(
                "invitations.recent_redemptions_limit must be positive".to_string(),
            ));
        }
        if invitations.token_generation_attempts == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "invitations.token_generation_attempts must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
