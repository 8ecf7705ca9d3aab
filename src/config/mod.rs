use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub forum: ForumConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    /// Allowed CORS origins. Empty mirrors the request origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_hours: i64,
}

/// Product toggles for behaviour the forum rules leave open.
#[derive(Debug, Deserialize, Clone)]
pub struct ForumConfig {
    #[serde(default)]
    pub allow_student_posts: bool,
    #[serde(default)]
    pub allow_parent_posts: bool,
    #[serde(default)]
    pub allow_self_vote: bool,
    #[serde(default)]
    pub winner_trigger: WinnerTrigger,
    #[serde(default)]
    pub allow_delete_locked_winner: bool,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            allow_student_posts: false,
            allow_parent_posts: false,
            allow_self_vote: false,
            winner_trigger: WinnerTrigger::Lazy,
            allow_delete_locked_winner: false,
        }
    }
}

/// When a missing monthly winner gets computed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WinnerTrigger {
    /// First read of a period computes and stores it.
    #[default]
    Lazy,
    /// Reads only return stored winners; an admin or scheduler must compute first.
    Precomputed,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub seed_on_startup: bool,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.static_dir", "static")?
            .set_default("server.secure_cookies", false)?
            .set_default("database.url", "sqlite://forum.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_hours", 24)?
            .set_default("bootstrap.seed_on_startup", false)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with FORUM__ prefix, double underscore separates levels)
            .add_source(
                Environment::with_prefix("FORUM")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                static_dir: "static".to_string(),
                cors_origins: Vec::new(),
                secure_cookies: false,
            },
            database: DatabaseConfig {
                url: "sqlite://forum.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_duration_hours: 24,
            },
            forum: ForumConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}
