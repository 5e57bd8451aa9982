use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub extension: ExtensionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Session cookie / JWT settings for the web app.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_session_hours() -> i64 { 12 }
fn default_cookie_name() -> String { "auth_token".into() }

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), session_hours: default_session_hours(), cookie_name: default_cookie_name() }
    }
}

/// External identity provider (token -> profile exchange).
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
    #[serde(default = "default_identity_timeout")]
    pub timeout_secs: u64,
}

fn default_userinfo_url() -> String { "https://www.googleapis.com/oauth2/v3/userinfo".into() }
fn default_identity_timeout() -> u64 { 10 }

impl Default for IdentityConfig {
    fn default() -> Self {
        Self { userinfo_url: default_userinfo_url(), timeout_secs: default_identity_timeout() }
    }
}

/// Page fetch settings used when capturing metadata server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Largest page body read before the capture is abandoned.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    /// Permit loopback, private and link-local targets. Off outside local testing.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

fn default_fetch_timeout() -> u64 { 15 }
fn default_user_agent() -> String { format!("buzzmemo/{}", env!("CARGO_PKG_VERSION")) }
fn default_max_bytes() -> usize { 2 * 1024 * 1024 }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            allow_private_hosts: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionConfig {
    #[serde(default = "default_saved_cache_path")]
    pub saved_cache_path: String,
    #[serde(default = "default_message_timeout")]
    pub message_timeout_ms: u64,
}

fn default_saved_cache_path() -> String { "data/saved_pages.json".into() }
fn default_message_timeout() -> u64 { 5_000 }

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self { saved_cache_path: default_saved_cache_path(), message_timeout_ms: default_message_timeout() }
    }
}

/// Longest session a token may be issued for (one year).
pub const MAX_SESSION_HOURS: i64 = 24 * 365;

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

/// Like [`load_from_file`], but a missing file is `None`. Unreadable or malformed files are errors.
pub fn load_optional(path: &str) -> Result<Option<AppConfig>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(anyhow!("cannot read {path}: {e}")),
    };
    let cfg: AppConfig = toml::from_str(&content).map_err(|e| anyhow!("invalid {path}: {e}"))?;
    Ok(Some(cfg))
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file when present, otherwise defaults filled from the environment.
    pub fn load_or_env() -> Result<Self> {
        Self::load_or_env_from(&config_path())
    }

    pub fn load_or_env_from(path: &str) -> Result<Self> {
        let mut cfg = load_optional(path)?.unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        if self.extension.message_timeout_ms == 0 {
            return Err(anyhow!("extension.message_timeout_ms must be positive"));
        }
        if self.capture.max_bytes == 0 {
            return Err(anyhow!("capture.max_bytes must be positive"));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if self.session_hours <= 0 || self.session_hours > MAX_SESSION_HOURS {
            return Err(anyhow!("auth.session_hours must be in 1..={MAX_SESSION_HOURS}"));
        }
        Ok(())
    }
}
