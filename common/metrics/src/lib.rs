use std::time::Instant;

use axum::{
    body::Body, extract::MatchedPath, http::Request, middleware::Next, response::IntoResponse,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Installs the global Prometheus recorder and returns the handle whose
/// `render()` serves the exposition text. Install at most once per process;
/// a second recorder in the same process (tests!) does not work well, so
/// callers gate this behind configuration.
pub fn setup_metrics_recorder() -> PrometheusHandle {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(EXPONENTIAL_SECONDS)
        .unwrap()
        .install_recorder()
        .unwrap()
}

/// Middleware to record some common HTTP metrics
/// Someday tower-http might provide a metrics middleware: https://github.com/tower-rs/tower-http/issues/57
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    // Run the rest of the request handling first, so we can measure it and get response
    // codes.
    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}

/// A guard recording the seconds between creation and drop as a histogram
/// entry. Drop runs on every exit path, early returns and unwinds included,
/// so the observation cannot be skipped by the code under measurement.
pub struct TimingGuard {
    name: &'static str,
    labels: Vec<(String, String)>,
    start: Instant,
}

// Shorthand constructor for that guard
pub fn timing_guard(name: &'static str) -> TimingGuard {
    TimingGuard {
        name,
        labels: Vec::new(),
        start: Instant::now(),
    }
}

impl TimingGuard {
    // This consumes the guard, making "label this span and then immediately report the timing"
    // a one-liner (simply don't re-bind the return value), but also it's a bit of a footgun.
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.labels.push((key.to_string(), value.to_string()));
        self
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let labels = self.labels.as_slice();
        metrics::histogram!(self.name, labels).record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::DebuggingRecorder;

    #[test]
    fn timing_guard_records_on_drop() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let _guard = timing_guard("test_latency").label("path", "/work");
        });

        let entries = snapshotter.snapshot().into_vec();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.key().name(), "test_latency");
    }

    #[test]
    fn timing_guard_records_when_the_measured_code_panics() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        let outcome = metrics::with_local_recorder(&recorder, || {
            std::panic::catch_unwind(|| {
                let _guard = timing_guard("test_latency");
                panic!("measured code failed");
            })
        });
        assert!(outcome.is_err());

        let entries = snapshotter.snapshot().into_vec();
        assert_eq!(entries.len(), 1);
    }
}
