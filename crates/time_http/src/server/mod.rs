use axum::{
    Router,
    extract::{RawQuery, Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::sync::oneshot;

use crate::config::{self, Config, ServerTimeouts};
use crate::core::error::{ServiceError, ServiceResult, TimeServerResult};
use crate::core::models::TimeZoneRequest;
use crate::core::provider::TimeServer;

pub mod listener;
pub mod shutdown;

use listener::Server;

const APPLICATION_JSON: &str = "application/json";

/// Build the HTTP router serving `<base_path>/time`
///
/// Methods other than GET (and HEAD) on the route are answered with
/// `405 Method Not Allowed`.
pub fn router(time_server: TimeServer, base_path: &str) -> Router {
    Router::new()
        .route(&config::time_path(base_path), get(get_time))
        .layer(middleware::from_fn(log_request))
        .with_state(time_server)
}

/// Current time for the zones named in the `tz` query parameter
async fn get_time(
    State(time_server): State<TimeServer>,
    RawQuery(query): RawQuery,
) -> TimeServerResult<Response> {
    let request = TimeZoneRequest::from_query(query.as_deref());
    let report = time_server.current_time(&request)?;
    let body = serde_json::to_vec(&report)?;

    Ok(([(header::CONTENT_TYPE, APPLICATION_JSON)], body).into_response())
}

async fn log_request(request: Request, next: Next) -> Response {
    tracing::info!(
        method = %request.method(),
        path = %request.uri().path(),
        "handling request"
    );
    next.run(request).await
}

/// Serve until an interrupt or terminate signal arrives, then drain
///
/// A drain that outlives the shutdown timeout is logged and still counts as
/// a clean exit. Startup failures and an unexpected end of the serve task are
/// returned as errors.
pub async fn run(config: Config) -> ServiceResult<()> {
    let mut signals = shutdown::SignalListener::register()?;
    let router = router(TimeServer::new(), &config.base_path);
    let server = Server::bind(config.bind_addr, router, ServerTimeouts::default()).await?;

    tracing::info!(
        addr = %server.local_addr()?,
        path = %config.time_path(),
        "listening"
    );

    let (stop, stopped) = oneshot::channel::<()>();
    let mut serving = tokio::spawn(server.serve(async move {
        let _ = stopped.await;
    }));

    tokio::select! {
        signal = signals.recv() => {
            let signal = signal?;
            tracing::info!(%signal, "shutdown signal received, attempting to shut down the server");
        }
        finished = &mut serving => {
            return match finished {
                Ok(Ok(())) => Err(ServiceError::Stopped),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(e.into()),
            };
        }
    }

    let _ = stop.send(());
    match serving.await? {
        Ok(()) => {
            tracing::info!("server shut down gracefully");
            Ok(())
        }
        Err(e @ ServiceError::DrainTimeout { .. }) => {
            tracing::error!(error = %e, "error shutting down the server");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
