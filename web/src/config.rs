//! # Configuration
//!
//! Server settings from flags or the environment. A `.env` file in the working
//! directory is loaded first.

use clap::Parser;
use std::time::Duration;

/// Settings of the `larder-web` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "larder-web", version, about = "Meal plan voting server")]
pub struct WebConfig {
    /// Address the server listens on.
    #[arg(long, env = "LARDER_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Postgres URL; the in-memory store is used when absent.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Seconds between deadline sweeps.
    #[arg(long, env = "LARDER_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Maximum pooled database connections.
    #[arg(long, env = "LARDER_DB_POOL_SIZE", default_value_t = 8)]
    pub db_pool_size: u32,

    /// Stop right after startup.
    #[arg(long, env = "LARDER_WEB_ONESHOT", hide = true)]
    pub oneshot: bool,
}

impl WebConfig {
    /// Loads `.env`, then parses the process arguments.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    /// Time between deadline sweeps; never zero.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let config = WebConfig::try_parse_from([
            "larder-web",
            "--bind",
            "0.0.0.0:9000",
            "--sweep-interval-secs",
            "0",
            "--db-pool-size",
            "2",
        ])
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
        assert_eq!(config.db_pool_size, 2);
        assert!(!config.oneshot);
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(WebConfig::try_parse_from(["larder-web", "--db-pool-size", "many"]).is_err());
    }
}
