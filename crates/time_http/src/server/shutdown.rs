use std::fmt;

use crate::core::error::{ServiceError, ServiceResult};

/// Signal that asked the process to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Installed handlers for the signals that stop the server
///
/// Handlers are active from `register` on, so a signal delivered before `recv`
/// is polled is queued rather than terminating the process.
pub struct SignalListener {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    pub fn register() -> ServiceResult<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(ServiceError::Signal)?,
            terminate: signal(SignalKind::terminate()).map_err(ServiceError::Signal)?,
        })
    }

    /// Wait for an interrupt or terminate signal
    pub async fn recv(&mut self) -> ServiceResult<ShutdownSignal> {
        tokio::select! {
            _ = self.interrupt.recv() => Ok(ShutdownSignal::Interrupt),
            _ = self.terminate.recv() => Ok(ShutdownSignal::Terminate),
        }
    }
}

/// Windows fallback, only Ctrl+C is available
#[cfg(not(unix))]
impl SignalListener {
    pub fn register() -> ServiceResult<Self> {
        Ok(Self {})
    }

    pub async fn recv(&mut self) -> ServiceResult<ShutdownSignal> {
        tokio::signal::ctrl_c().await.map_err(ServiceError::Signal)?;
        Ok(ShutdownSignal::Interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_display() {
        assert_eq!(ShutdownSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(ShutdownSignal::Terminate.to_string(), "SIGTERM");
    }

    #[tokio::test]
    async fn test_register_signal_handlers() {
        assert!(SignalListener::register().is_ok());
    }
}
