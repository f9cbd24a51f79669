//! Test configuration helpers for pointing a harvester at a mock server

use geo_harvest::{Config, EndpointConfig, Harvester, RetryConfig};
use std::time::Duration;
use wiremock::MockServer;

/// Config whose endpoints live on `server`, with short delays
pub fn config_for(server: &MockServer) -> Config {
    Config {
        endpoints: EndpointConfig::with_base(&server.uri()),
        request_timeout: Duration::from_secs(5),
        retry: RetryConfig {
            rate_limit_delay: Duration::from_millis(10),
            ..RetryConfig::default()
        },
        ..Config::default()
    }
}

/// Harvester over real HTTP against `server`
pub fn harvester_for(server: &MockServer) -> Harvester {
    Harvester::new(config_for(server)).expect("valid test config")
}
