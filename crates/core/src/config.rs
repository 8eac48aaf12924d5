use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Longest accepted token lifetime: 30 days
pub const MAX_TOKEN_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_seconds: i64,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

/// The fixed admin credential pair provisioned at startup
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// JSON snapshot of the document store; in-memory only when unset
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_token_expiry() -> i64 {
    3600 // 1 hour
}

fn default_min_password_length() -> usize {
    6
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

fn default_cors_origin() -> Option<String> {
    Some("http://localhost:5173".to_string())
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with DINEHUB_ and use `__` between sections
    /// Example: DINEHUB_AUTH__JWT_SECRET, DINEHUB_SERVER__PORT
    ///
    /// Returns the config and a list of environment variable overrides
    pub fn load_with_env() -> Result<(Self, Vec<String>), ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("dinehub").required(false))
            .add_source(
                Environment::with_prefix("DINEHUB")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut overrides = Vec::new();

        let env_vars = [
            ("DINEHUB_AUTH__JWT_SECRET", "auth.jwt_secret"),
            ("DINEHUB_AUTH__TOKEN_EXPIRY_SECONDS", "auth.token_expiry_seconds"),
            ("DINEHUB_AUTH__MIN_PASSWORD_LENGTH", "auth.min_password_length"),
            ("DINEHUB_ADMIN__USERNAME", "admin.username"),
            ("DINEHUB_ADMIN__PASSWORD", "admin.password"),
            ("DINEHUB_SERVER__HOST", "server.host"),
            ("DINEHUB_SERVER__PORT", "server.port"),
            ("DINEHUB_SERVER__REQUEST_TIMEOUT_SECS", "server.request_timeout_secs"),
            ("DINEHUB_SERVER__CORS_ORIGIN", "server.cors_origin"),
            ("DINEHUB_STORAGE__SNAPSHOT_PATH", "storage.snapshot_path"),
        ];

        for (env_var, config_key) in env_vars {
            if std::env::var(env_var).is_ok() {
                overrides.push(config_key.to_string());
            }
        }

        let app_config = config.try_deserialize()?;
        Ok((app_config, overrides))
    }

    /// Reject configurations that would only fail on first use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("auth.jwt_secret must be set".to_string()));
        }
        if self.auth.token_expiry_seconds <= 0 {
            return Err(ConfigError::Message(
                "auth.token_expiry_seconds must be positive".to_string(),
            ));
        }
        if self.auth.token_expiry_seconds > MAX_TOKEN_EXPIRY_SECONDS {
            return Err(ConfigError::Message(format!(
                "auth.token_expiry_seconds must not exceed {MAX_TOKEN_EXPIRY_SECONDS}"
            )));
        }
        if self.admin.username.trim().is_empty() || self.admin.password.is_empty() {
            return Err(ConfigError::Message(
                "admin.username and admin.password must be set".to_string(),
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
