use tracing_subscriber::{EnvFilter, prelude::*};

use crate::core::error::{ServiceError, ServiceResult};

/// Level used when `RUST_LOG` is not set
const DEFAULT_LOG_LEVEL: &str = "info";

/// Initialize logging
///
/// # Environment Variables
/// - `RUST_LOG`: Controls logging verbosity (trace, debug, info, warn, error),
///   defaults to `info`
///
/// # Returns
/// - `Ok(())` if logging is successfully initialized
/// - `Err(ServiceError::LoggingInitialization)` if a global subscriber is
///   already installed
pub fn init_logging(json: bool) -> ServiceResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()
    };

    result.map_err(|e| ServiceError::LoggingInitialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_initialization_fails() {
        // Only one global subscriber may exist per process
        let _ = init_logging(false);
        let second = init_logging(true);

        assert!(matches!(
            second,
            Err(ServiceError::LoggingInitialization(_))
        ));
    }
}
