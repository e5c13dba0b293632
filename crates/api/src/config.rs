//! Application configuration loaded from environment variables.

use std::time::Duration;

use orchestrator::OrchestratorConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory store when unset
/// - `INVENTORY_SERVICE_URL`: inventory base URL; in-memory catalog when unset
/// - `PAYMENT_SERVICE_URL`: payment base URL; in-memory processor when unset
/// - `INVENTORY_STOCK`: seed for the in-memory catalog, `SKU-1=10,SKU-2=5`
/// - `ORDER_TIMEOUT_MS`: deadline for one order operation (default: `5000`)
/// - `CALL_TIMEOUT_MS`: bound on a single outbound call (default: `5000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub inventory_service_url: Option<String>,
    pub payment_service_url: Option<String>,
    pub inventory_stock: Vec<(String, u32)>,
    pub order_timeout: Duration,
    pub call_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let millis = |key: &str, default: Duration| {
            non_empty(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty("DATABASE_URL"),
            inventory_service_url: non_empty("INVENTORY_SERVICE_URL"),
            payment_service_url: non_empty("PAYMENT_SERVICE_URL"),
            inventory_stock: non_empty("INVENTORY_STOCK")
                .map(|v| parse_stock(&v))
                .unwrap_or_default(),
            order_timeout: millis("ORDER_TIMEOUT_MS", defaults.order_timeout),
            call_timeout: millis("CALL_TIMEOUT_MS", defaults.call_timeout),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Orchestrator settings derived from the configured timeouts.
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig::with_timeouts(self.order_timeout, self.call_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            inventory_service_url: None,
            payment_service_url: None,
            inventory_stock: Vec::new(),
            order_timeout: Duration::from_millis(5000),
            call_timeout: Duration::from_millis(5000),
        }
    }
}

/// Parses `id=qty` pairs separated by commas. Malformed pairs are skipped.
fn parse_stock(raw: &str) -> Vec<(String, u32)> {
    raw.split(',')
        .filter_map(|pair| {
            let (id, qty) = pair.split_once('=')?;
            let id = id.trim();
            if id.is_empty() {
                return None;
            }
            Some((id.to_string(), qty.trim().parse().ok()?))
        })
        .collect()
}
