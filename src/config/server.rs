//! # Probe Server
//!
//! Where `/metrics`, `/healthz` and `/readyz` listen, and how long startup waits for the
//! listener before giving up on the process.

use crate::constants::{
    DEFAULT_METRICS_PORT, DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Startup fails when the listener is not up within this window
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_METRICS_PORT),
            startup_timeout: Duration::from_secs(DEFAULT_SERVER_STARTUP_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_SERVER_POLL_INTERVAL_MS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to the defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            lookup(key).and_then(|raw| raw.trim().parse().ok())
        }
        let defaults = Self::default();

        let ip = parsed(&lookup, "METRICS_BIND_ADDRESS").unwrap_or(defaults.bind_addr.ip());
        let port = parsed(&lookup, "METRICS_PORT").unwrap_or(defaults.bind_addr.port());
        Self {
            bind_addr: SocketAddr::new(ip, port),
            startup_timeout: parsed(&lookup, "SERVER_STARTUP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.startup_timeout),
            // A zero interval would spin the startup wait
            poll_interval: parsed(&lookup, "SERVER_POLL_INTERVAL_MS")
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        }
    }
}
