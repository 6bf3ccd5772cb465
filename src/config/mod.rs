use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Outbound notification webhook (optional — disabled when unset)
    pub notify_webhook_url: Option<String>,

    // Ledger reconciler
    pub reconciler_enabled: bool,
    pub reconciler_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok().filter(|s| !s.is_empty()),

            reconciler_enabled: env::var("RECONCILER_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            reconciler_interval_secs: env::var("RECONCILER_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
        })
    }
}
