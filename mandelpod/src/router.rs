use std::future::ready;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use common_metrics::{setup_metrics_recorder, track_metrics};
use health::{HealthIndicator, ShutdownLatch};

use crate::endpoints;
use crate::mandel::Viewport;

#[derive(Clone)]
pub struct AppState {
    pub health: HealthIndicator,
    pub shutdown: ShutdownLatch,
    pub viewport: Arc<Viewport>,
}

async fn index() -> &'static str {
    "mandelpod"
}

pub fn router(
    health: HealthIndicator,
    shutdown: ShutdownLatch,
    viewport: Viewport,
    metrics: bool,
) -> Router {
    let state = AppState {
        health,
        shutdown,
        viewport: Arc::new(viewport),
    };

    let router = Router::new()
        .route("/", get(index))
        .route("/host", get(endpoints::host))
        .route("/work", get(endpoints::work))
        .route("/probe", post(endpoints::probe_update))
        .route("/probe/liveness", get(endpoints::liveness))
        .route("/probe/readiness", get(endpoints::readiness))
        .route("/lifecycle/postStart", get(endpoints::post_start))
        .route("/lifecycle/preStop", get(endpoints::pre_stop))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install metrics unless asked to
    // Installing a global recorder when mandelpod is used as a library (during tests etc)
    // does not work well.
    if metrics {
        let recorder_handle = setup_metrics_recorder();
        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use health::HealthState;
    use http_body_util::BodyExt; // for `collect`
    use tower::ServiceExt; // for `oneshot`

    fn test_router() -> (Router, HealthIndicator, ShutdownLatch) {
        let health = HealthIndicator::new();
        let shutdown = ShutdownLatch::new();
        let viewport = Viewport::new(-2.0, -1.0, 1.0, 1.0, 20, 256).unwrap();
        let app = router(health.clone(), shutdown.clone(), viewport, false);
        (app, health, shutdown)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn probe_request(state: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/probe")
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Body::from(format!("state={state}")))
            .unwrap()
    }

    #[tokio::test]
    async fn index_responds_with_banner() {
        let (app, _, _) = test_router();

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "mandelpod");
    }

    #[tokio::test]
    async fn host_reports_a_name() {
        let (app, _, _) = test_router();

        let response = app.oneshot(get_request("/host")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn work_renders_the_grid() {
        let (app, _, _) = test_router();

        let first = app.clone().oneshot(get_request("/work")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let first = body_string(first).await;

        assert!(first.starts_with('|') && first.ends_with('|'));
        assert_eq!(first[1..first.len() - 1].split('\n').count(), 20);

        // Same viewport, same bytes.
        let second = app.oneshot(get_request("/work")).await.unwrap();
        assert_eq!(body_string(second).await, first);
    }

    #[tokio::test]
    async fn probe_update_reports_previous_state() {
        let (app, health, _) = test_router();

        let response = app
            .clone()
            .oneshot(probe_request("ZOMBIE"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "READY");
        assert_eq!(health.get(), HealthState::Zombie);

        let response = app.oneshot(probe_request("ALIVE")).await.unwrap();
        assert_eq!(body_string(response).await, "ZOMBIE");
        assert_eq!(health.get(), HealthState::Alive);
    }

    #[tokio::test]
    async fn probe_update_rejects_unknown_states() {
        let (app, health, _) = test_router();

        for bad in ["dead", "", "ready"] {
            let response = app.clone().oneshot(probe_request(bad)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            // A rejected update leaves the state alone.
            assert_eq!(health.get(), HealthState::Ready);
        }
    }

    #[tokio::test]
    async fn liveness_follows_the_zombie_rule() {
        let (app, health, _) = test_router();

        health.set(HealthState::Zombie);
        let response = app
            .clone()
            .oneshot(get_request("/probe/liveness"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "ZOMBIE");

        for live in [HealthState::Alive, HealthState::Ready] {
            health.set(live);
            let response = app
                .clone()
                .oneshot(get_request("/probe/liveness"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_string(response).await, "ALIVE");
        }
    }

    #[tokio::test]
    async fn readiness_requires_ready() {
        let (app, health, _) = test_router();

        let response = app
            .clone()
            .oneshot(get_request("/probe/readiness"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "READY");

        for unready in [HealthState::Zombie, HealthState::Alive] {
            health.set(unready);
            let response = app
                .clone()
                .oneshot(get_request("/probe/readiness"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_string(response).await, unready.as_str());
        }
    }

    #[tokio::test]
    async fn post_start_is_a_no_op() {
        let (app, health, shutdown) = test_router();

        let response = app
            .oneshot(get_request("/lifecycle/postStart"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.is_empty());
        assert_eq!(health.get(), HealthState::Ready);
        assert!(!shutdown.is_released());
    }

    #[tokio::test]
    async fn pre_stop_releases_the_latch_once() {
        let (app, health, shutdown) = test_router();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(get_request("/lifecycle/preStop"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(body_string(response).await.is_empty());
            assert!(shutdown.is_released());
        }

        // The hook drains traffic via the latch, not the health state.
        assert_eq!(health.get(), HealthState::Ready);
    }
}
