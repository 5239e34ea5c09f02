//! Listener and connection handling
//!
//! Every accepted connection is served on its own task. The accept loop stops
//! when the shutdown future resolves, after which open connections are asked to
//! finish their current request and close, bounded by the shutdown timeout.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower::ServiceExt;

use crate::config::ServerTimeouts;
use crate::core::error::{ServiceError, ServiceResult};

/// A bound listener ready to serve a router
pub struct Server {
    listener: TcpListener,
    router: Router,
    timeouts: ServerTimeouts,
}

impl Server {
    pub async fn bind(
        addr: SocketAddr,
        router: Router,
        timeouts: ServerTimeouts,
    ) -> ServiceResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServiceError::Bind { addr, source })?;

        Ok(Self {
            listener,
            router,
            timeouts,
        })
    }

    pub fn local_addr(&self) -> ServiceResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves, then drain
    ///
    /// Returns `ServiceError::DrainTimeout` when connections are still open
    /// once the shutdown timeout has elapsed. Those connections are aborted.
    pub async fn serve<F>(self, shutdown: F) -> ServiceResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            listener,
            router,
            timeouts,
        } = self;

        let (closing_tx, closing_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        tracing::debug!(peer = %peer_addr, "accepted connection");
                        connections.spawn(serve_connection(
                            stream,
                            router.clone(),
                            timeouts,
                            closing_rx.clone(),
                        ));
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "connection task failed");
                    }
                }
            }
        }

        // Stop accepting before draining
        drop(listener);
        let _ = closing_tx.send(true);
        tracing::info!(connections = connections.len(), "draining open connections");

        let drained = tokio::time::timeout(timeouts.shutdown, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            let remaining = connections.len();
            connections.abort_all();
            return Err(ServiceError::DrainTimeout {
                timeout: timeouts.shutdown,
                remaining,
            });
        }

        Ok(())
    }
}

/// Serve one HTTP/1 connection until the peer leaves, it goes idle, or the
/// server starts closing
///
/// `timeouts.read` bounds how long a fresh connection may take to deliver its
/// first request. Between keep-alive requests only `timeouts.idle` applies, so
/// hyper's header timer is never shorter than the idle timeout.
async fn serve_connection(
    stream: TcpStream,
    router: Router,
    timeouts: ServerTimeouts,
    mut closing: watch::Receiver<bool>,
) {
    let activity = Arc::new(ConnectionActivity::new());

    let service = {
        let activity = Arc::clone(&activity);
        service_fn(move |request: hyper::Request<Incoming>| {
            let router = router.clone();
            let activity = Arc::clone(&activity);
            async move {
                let _in_flight = activity.begin();
                Ok::<_, Infallible>(respond_within(timeouts.write, router, request).await)
            }
        })
    };

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read.max(timeouts.idle))
        .keep_alive(true);

    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let first_request_deadline = tokio::time::Instant::now() + timeouts.read;
    let mut shutting_down = false;
    loop {
        let idle_wait = activity.idle_wait(timeouts.idle);
        tokio::select! {
            result = connection.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(error = %e, "connection closed with error");
                }
                break;
            }
            _ = closing.changed(), if !shutting_down => {
                connection.as_mut().graceful_shutdown();
                shutting_down = true;
            }
            () = tokio::time::sleep_until(first_request_deadline),
                if !shutting_down && !activity.has_served() =>
            {
                if !activity.has_served() {
                    tracing::debug!(timeout = ?timeouts.read, "no request read in time");
                    connection.as_mut().graceful_shutdown();
                    shutting_down = true;
                }
            }
            () = tokio::time::sleep(idle_wait), if !shutting_down => {
                if activity.is_idle(timeouts.idle) {
                    tracing::debug!("closing idle connection");
                    connection.as_mut().graceful_shutdown();
                    shutting_down = true;
                }
            }
        }
    }
}

/// Run the router, answering 503 if no response is ready within `limit`
async fn respond_within(
    limit: Duration,
    router: Router,
    request: hyper::Request<Incoming>,
) -> Response {
    match tokio::time::timeout(limit, router.oneshot(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(never)) => match never {},
        Err(_) => {
            tracing::warn!(timeout = ?limit, "response not produced in time");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// Tracks in-flight requests and last activity of a connection
struct ConnectionActivity {
    started: Instant,
    last_active_ms: AtomicU64,
    in_flight: AtomicUsize,
    served: AtomicBool,
}

impl ConnectionActivity {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            last_active_ms: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            served: AtomicBool::new(false),
        }
    }

    fn begin(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.served.store(true, Ordering::SeqCst);
        self.touch();
        InFlightGuard {
            activity: Arc::clone(self),
        }
    }

    fn touch(&self) {
        let elapsed = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_active_ms.store(elapsed, Ordering::SeqCst);
    }

    /// Whether a request has been read on this connection
    fn has_served(&self) -> bool {
        self.served.load(Ordering::SeqCst)
    }

    /// Time since the last request finished, `None` while one is in flight
    fn idle_for(&self) -> Option<Duration> {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return None;
        }
        let last_active = Duration::from_millis(self.last_active_ms.load(Ordering::SeqCst));
        Some(self.started.elapsed().saturating_sub(last_active))
    }

    fn idle_wait(&self, idle: Duration) -> Duration {
        match self.idle_for() {
            Some(elapsed) => idle.saturating_sub(elapsed),
            None => idle,
        }
    }

    fn is_idle(&self, idle: Duration) -> bool {
        self.idle_for().is_some_and(|elapsed| elapsed >= idle)
    }
}

struct InFlightGuard {
    activity: Arc<ConnectionActivity>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.activity.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.activity.touch();
    }
}
