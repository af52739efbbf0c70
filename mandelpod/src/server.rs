use std::future::Future;

use tokio::net::TcpListener;

use health::{HealthIndicator, ShutdownLatch};

use crate::config::Config;
use crate::mandel::Viewport;
use crate::router;

/// Builds the app state from config and serves it until either the caller's
/// shutdown future resolves (process signals) or the pre-stop hook releases
/// the shutdown latch. In-flight requests are drained before returning.
pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let health = HealthIndicator::new();
    let latch = ShutdownLatch::new();

    let viewport = Viewport::new(
        config.render_lower_r,
        config.render_lower_i,
        config.render_upper_r,
        config.render_upper_i,
        config.render_lines,
        config.render_limit,
    )
    .expect("invalid render viewport");

    let app = router::router(health, latch.clone(), viewport, config.export_prometheus);

    tracing::info!("listening on {:?}", listener.local_addr().unwrap());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown => tracing::info!("shutdown signal received"),
                _ = latch.released() => tracing::info!("pre-stop hook released the shutdown latch"),
            }
        })
        .await
        .expect("server error");

    tracing::info!("HTTP server graceful shutdown completed");
}
