use std::net::SocketAddr;
use std::time::Duration;

/// Default port the service listens on
pub const DEFAULT_PORT: u16 = 8080;
/// Default prefix the `/time` route is mounted under
pub const DEFAULT_BASE_PATH: &str = "/api";

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub base_path: String,
    pub json_logs: bool,
}

impl Config {
    /// Full path of the time endpoint, e.g. `/api/time`
    pub fn time_path(&self) -> String {
        time_path(&self.base_path)
    }
}

pub fn time_path(base_path: &str) -> String {
    format!("{base_path}/time")
}

/// Connection timeouts applied by the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimeouts {
    /// Time allowed for a client to send request headers
    pub read: Duration,
    /// Time allowed to produce a response
    pub write: Duration,
    /// Keep-alive connections without a request in flight are closed after this
    pub idle: Duration,
    /// Upper bound on draining open connections at shutdown
    pub shutdown: Duration,
}

impl Default for ServerTimeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(1),
            write: Duration::from_secs(10),
            idle: Duration::from_secs(5),
            shutdown: Duration::from_secs(30),
        }
    }
}
