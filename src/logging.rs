//! Request logging for the tower `TraceLayer`.
//!
//! Only the path is recorded. The callback's query string carries the
//! authorization code and must never reach the logs.

use std::time::Duration;

use http::{Request, Response};
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::{Span, field, info, info_span};

#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingSpanner;

impl<B> MakeSpan<B> for LoggingSpanner {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        info_span!(
            "request",
            method = %request.method(),
            path = request.uri().path(),
            status_code = field::Empty,
        )
    }
}

impl<B> OnResponse<B> for LoggingSpanner {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        span.record("status_code", response.status().as_u16());
        info!(
            status_code = response.status().as_u16(),
            latency_ms = latency.as_millis() as u64,
            "Request complete"
        );
    }
}

#[cfg(test)]
pub fn setup_test_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_test_writer()
                .with_level(true),
        )
        .with(tracing_subscriber::EnvFilter::new(
            "debug,hyper=info,hyper_util=info,reqwest=info,wiremock=info",
        ))
        .try_init();
}
