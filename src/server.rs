use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::routes;
use crate::state::AppState;

/// Binds `0.0.0.0:<port>` and serves until SIGINT or SIGTERM.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    serve_on(listener, state, shutdown_signal()).await
}

/// Serves on `listener` until `shutdown` resolves.
///
/// On shutdown the listener stops accepting, in-flight requests get up to
/// the grace period to finish, then background tasks are drained under the
/// same bound. Connections still open after the grace period are dropped.
pub async fn serve_on<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let grace = state.config.server.shutdown_grace();
    let background = state.background.clone();
    let sweeper = state.limiter.enabled().then(|| state.limiter.spawn_sweeper());

    info!(
        addr = %listener.local_addr()?,
        environment = state.config.environment.as_str(),
        "server listening"
    );

    let stopping = Arc::new(Notify::new());
    let signal = {
        let stopping = Arc::clone(&stopping);
        async move {
            shutdown.await;
            info!("shutdown requested, draining connections");
            stopping.notify_one();
        }
    };

    let app = routes::app(state);
    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(signal)
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result.context("server error")?,
        _ = async {
            stopping.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs(), "connections still open after grace period, closing");
        }
    }

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    background.drain(grace).await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use crate::testing::TestApp;

    #[tokio::test]
    async fn serves_until_shutdown_then_drains_background_work() {
        let app = TestApp::new();
        let state = app.state.clone();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(serve_on(listener, state.clone(), async {
            let _ = stop_rx.await;
        }));

        let response = reqwest::get(format!("http://{}/api/v1/healthcheck", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        state.background.spawn("slow", async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
        });

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(10), server)
            .await
            .expect("server should stop")
            .unwrap()
            .unwrap();
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(state.background.active(), 0);
    }
}
