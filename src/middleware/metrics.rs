use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;

use super::Middleware;
use crate::dispatcher::{HandlerResponse, RequestContext};
use crate::error::DispatchError;
use crate::ids::RequestId;

/// Lock-free request counters.
///
/// Handled requests are counted in `after`; failed dispatches are counted in `on_error`
/// and bucketed by outcome. All updates use `Ordering::Relaxed`: values are eventually
/// consistent and cheap to collect.
#[derive(Default)]
pub struct MetricsMiddleware {
    handled: AtomicUsize,
    total_latency_ns: AtomicU64,
    not_found: AtomicUsize,
    method_not_allowed: AtomicUsize,
    bad_requests: AtomicUsize,
    handler_failures: AtomicUsize,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that reached a handler and produced a response.
    #[must_use]
    pub fn handled_count(&self) -> usize {
        self.handled.load(Ordering::Relaxed)
    }

    /// Every request seen, successful or not.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.handled_count() + self.error_count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.not_found_count()
            + self.method_not_allowed_count()
            + self.bad_request_count()
            + self.handler_failure_count()
    }

    #[must_use]
    pub fn not_found_count(&self) -> usize {
        self.not_found.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn method_not_allowed_count(&self) -> usize {
        self.method_not_allowed.load(Ordering::Relaxed)
    }

    /// 400 and 413 outcomes.
    #[must_use]
    pub fn bad_request_count(&self) -> usize {
        self.bad_requests.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn handler_failure_count(&self) -> usize {
        self.handler_failures.load(Ordering::Relaxed)
    }

    /// Mean handler latency; zero before the first handled request.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.handled.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Emit the current counters as one `info` event.
    pub fn log_summary(&self) {
        info!(
            requests = self.request_count(),
            handled = self.handled_count(),
            not_found = self.not_found_count(),
            method_not_allowed = self.method_not_allowed_count(),
            bad_requests = self.bad_request_count(),
            handler_failures = self.handler_failure_count(),
            avg_latency_us = self.average_latency().as_micros() as u64,
            "Request metrics"
        );
    }

    /// Log a summary every `interval` on a detached background thread.
    ///
    /// # Errors
    ///
    /// Returns the spawn error when the thread cannot be created.
    pub fn spawn_reporter(self: Arc<Self>, interval: Duration) -> io::Result<()> {
        thread::Builder::new()
            .name("metrics-reporter".into())
            .spawn(move || loop {
                thread::sleep(interval);
                self.log_summary();
            })
            .map(|_| ())
    }
}

impl Middleware for MetricsMiddleware {
    fn after(&self, _ctx: &RequestContext, _res: &mut HandlerResponse, latency: Duration) {
        self.handled.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns.fetch_add(
            u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
    }

    fn on_error(&self, _request_id: &RequestId, err: &DispatchError) {
        let counter = match err {
            DispatchError::NotFound { .. } => &self.not_found,
            DispatchError::MethodNotAllowed { .. } => &self.method_not_allowed,
            DispatchError::InvalidParameters { .. }
            | DispatchError::MalformedBody { .. }
            | DispatchError::PayloadTooLarge { .. } => &self.bad_requests,
            DispatchError::HandlerNotRegistered { .. } | DispatchError::HandlerFailed { .. } => {
                &self.handler_failures
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
