use std::env;

/// Platform fee charged on checkout when no settings row exists yet,
/// in basis points (200 = 2%).
pub const DEFAULT_PLATFORM_FEE_BPS: i32 = 200;

/// Default vendor commission rate in basis points.
pub const DEFAULT_COMMISSION_RATE_BPS: i32 = 1000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            host,
        })
    }
}
