use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::config::{Config, DEFAULT_BASE_PATH, DEFAULT_PORT};
use crate::core::error::{ServiceError, ServiceResult};

/// Time HTTP Server
///
/// Reports the current time in one or more IANA timezones over HTTP.
///
/// ## Endpoint
/// ```text
/// GET /api/time                                   -> {"timezones":{"UTC":"01 Jan 24 00:00 UTC"}}
/// GET /api/time?tz=America/New_York,Europe/London -> one entry per zone
/// ```
///
/// ## Environment Variables
/// - `RUST_LOG`: Controls logging verbosity (trace, debug, info, warn, error)
#[derive(Parser, Debug, Clone)]
#[command(name = "http-server-time")]
#[command(about = "An HTTP server reporting the current time in IANA timezones")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Path prefix the `/time` route is mounted under
    #[arg(long, default_value = DEFAULT_BASE_PATH, value_name = "PATH")]
    pub base_path: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Parse CLI arguments and convert to configuration
    pub fn parse_config() -> ServiceResult<Config> {
        Self::parse().into_config()
    }

    pub fn into_config(self) -> ServiceResult<Config> {
        validate_base_path(&self.base_path)?;
        Ok(Config {
            bind_addr: SocketAddr::new(self.host, self.port),
            base_path: self.base_path,
            json_logs: self.json_logs,
        })
    }
}

/// A base path is either empty or starts with `/`, has no trailing `/` and
/// contains no route parameter syntax
fn validate_base_path(path: &str) -> ServiceResult<()> {
    let well_formed = path.is_empty() || (path.starts_with('/') && !path.ends_with('/'));
    let valid = well_formed && !path.contains([':', '*', '{', '}']);
    if valid {
        Ok(())
    } else {
        Err(ServiceError::InvalidBasePath {
            path: path.to_string(),
        })
    }
}
