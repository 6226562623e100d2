//! Runtime settings read from the environment (after `dotenvy` has loaded `.env`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Backing store selected by `STORE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(format!("invalid store: {} (expected postgres or memory)", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub store: StoreKind,
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// HS256 signing key for access and registration tokens.
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub register_token_expire_hours: i64,
    pub reset_token_expire_hours: i64,
    /// Public base URL of this server; avatar links are built from it.
    pub server_host: String,
    /// Page that completes a registration; the token is appended as `?token=`.
    pub frontend_url: String,
    /// Page that sets a new password; the reset token is appended as `?token=`.
    pub reset_password_url: String,
    pub media_dir: PathBuf,
    pub default_avatar_path: String,
    pub max_avatar_bytes: usize,
    pub cors_origins: Vec<String>,
    pub first_superuser_email: Option<String>,
    pub first_superuser_password: Option<String>,
    /// Period of the poll expiry sweep; 0 disables it.
    pub poll_sweep_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            store: StoreKind::Postgres,
            database_url: "postgres://localhost/testdesk".into(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            secret_key: "change-me".into(),
            access_token_expire_minutes: 60 * 24 * 8,
            register_token_expire_hours: 48,
            reset_token_expire_hours: 48,
            server_host: "http://localhost:5000".into(),
            frontend_url: "http://localhost:9000/register".into(),
            reset_password_url: "http://localhost:9000/reset-password".into(),
            media_dir: PathBuf::from("media"),
            default_avatar_path: "media/default/avatar.png".into(),
            max_avatar_bytes: 5 * 1024 * 1024,
            cors_origins: vec!["http://localhost:9000".into()],
            first_superuser_email: None,
            first_superuser_password: None,
            poll_sweep_interval_secs: 60,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| format!("invalid value for {}: {}", key, v)),
        _ => Ok(default),
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl Settings {
    /// Read every setting from the environment, falling back to `Settings::default()`.
    pub fn from_env() -> Result<Self, String> {
        let d = Settings::default();
        let store = match env_opt("STORE") {
            Some(s) => s.parse()?,
            None => d.store,
        };
        let cors_origins = env_opt("CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or(d.cors_origins);
        let secret_key = env_opt("SECRET_KEY").unwrap_or(d.secret_key);
        if secret_key == "change-me" {
            tracing::warn!("SECRET_KEY is not set; using the built-in development key");
        }
        Ok(Settings {
            store,
            database_url: env_opt("DATABASE_URL").unwrap_or(d.database_url),
            bind_addr: env_or("BIND_ADDR", d.bind_addr)?,
            secret_key,
            access_token_expire_minutes: env_or("ACCESS_TOKEN_EXPIRE_MINUTES", d.access_token_expire_minutes)?,
            register_token_expire_hours: env_or("REGISTER_TOKEN_EXPIRE_HOURS", d.register_token_expire_hours)?,
            reset_token_expire_hours: env_or("RESET_TOKEN_EXPIRE_HOURS", d.reset_token_expire_hours)?,
            server_host: env_opt("SERVER_HOST").unwrap_or(d.server_host),
            frontend_url: env_opt("FRONTEND_URL").unwrap_or(d.frontend_url),
            reset_password_url: env_opt("RESET_PASSWORD_URL").unwrap_or(d.reset_password_url),
            media_dir: env_opt("MEDIA_DIR").map(PathBuf::from).unwrap_or(d.media_dir),
            default_avatar_path: env_opt("DEFAULT_AVATAR_PATH").unwrap_or(d.default_avatar_path),
            max_avatar_bytes: env_or("MAX_AVATAR_BYTES", d.max_avatar_bytes)?,
            cors_origins,
            first_superuser_email: env_opt("FIRST_SUPERUSER_EMAIL"),
            first_superuser_password: env_opt("FIRST_SUPERUSER_PASSWORD"),
            poll_sweep_interval_secs: env_or("POLL_SWEEP_INTERVAL_SECS", d.poll_sweep_interval_secs)?,
        })
    }
}
