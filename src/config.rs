//! Connection settings shared by every subcommand.

use std::time::Duration;

use crate::http::{
    ClientConfig, DEFAULT_ORIGIN, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT,
    RequestPolicy,
};

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct ConnectionArgs {
    /// Backend base URL (only allow-listed hosts or same-origin paths are used)
    #[arg(
        long = "api-url",
        env = "WALLET_API_BASE_URL",
        value_name = "URL",
        global = true
    )]
    pub api_url: Option<String>,

    /// Origin that same-origin API paths are served from
    #[arg(
        long,
        env = "WALLET_ORIGIN",
        value_name = "URL",
        default_value = DEFAULT_ORIGIN,
        global = true
    )]
    pub origin: String,

    /// Additional attempts after a transient failure
    #[arg(long, env = "WALLET_RETRIES", value_name = "N", default_value_t = DEFAULT_RETRIES, global = true)]
    pub retries: u32,

    /// Base backoff delay in milliseconds, doubled on every retry
    #[arg(
        long = "retry-delay-ms",
        env = "WALLET_RETRY_DELAY_MS",
        value_name = "MS",
        default_value_t = DEFAULT_RETRY_DELAY.as_millis() as u64,
        global = true
    )]
    pub retry_delay_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(
        long = "timeout-ms",
        env = "WALLET_TIMEOUT_MS",
        value_name = "MS",
        default_value_t = DEFAULT_TIMEOUT.as_millis() as u64,
        global = true
    )]
    pub timeout_ms: u64,
}

impl ConnectionArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            origin: self.origin.clone(),
            defaults: RequestPolicy {
                retries: self.retries,
                retry_delay: Duration::from_millis(self.retry_delay_ms),
                timeout: if self.timeout_ms == 0 {
                    DEFAULT_TIMEOUT
                } else {
                    Duration::from_millis(self.timeout_ms)
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        connection: ConnectionArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["wallet"]).unwrap();
        let config = cli.connection.client_config();
        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert_eq!(config.defaults, RequestPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let cli = TestCli::try_parse_from([
            "wallet",
            "--api-url",
            "http://localhost:8080/api",
            "--retries",
            "0",
            "--retry-delay-ms",
            "250",
            "--timeout-ms",
            "1500",
        ])
        .unwrap();
        let config = cli.connection.client_config();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/api"));
        assert_eq!(config.defaults.retries, 0);
        assert_eq!(config.defaults.retry_delay, Duration::from_millis(250));
        assert_eq!(config.defaults.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_zero_timeout_keeps_default() {
        let cli = TestCli::try_parse_from(["wallet", "--timeout-ms", "0"]).unwrap();
        assert_eq!(cli.connection.client_config().defaults.timeout, DEFAULT_TIMEOUT);
    }
}
