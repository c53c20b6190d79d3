use crate::error::{UNEXPECTED_ERROR, error_response};
use axum::{body::Body, http::Request, http::StatusCode, middleware::Next, response::Response};
use std::any::Any;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Server errors are logged where they are raised; here they only get a trace line.
pub async fn log_request_errors(req: Request<Body>, next: Next) -> Response {
    let uri = req.uri().clone();
    let method = req.method().clone();
    let started = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;
    if status.is_client_error() {
        warn!(%method, %uri, %status, latency_ms, "Client error");
    } else if status.is_server_error() {
        debug!(%method, %uri, %status, latency_ms, "Server error");
    } else {
        debug!(%method, %uri, %status, latency_ms, "Request served");
    }

    response
}

/// Renders a handler panic as a `500 {"error": ...}` response.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::new()
    };
    let message = if message.trim().is_empty() {
        UNEXPECTED_ERROR.to_string()
    } else {
        message
    };

    error!(%message, "Handler panicked");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;
    use axum::Router;
    use axum::body::to_bytes;
    use axum::routing::get;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Counts `ERROR` events
    #[derive(Clone, Default)]
    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    async fn failing_upload() -> UploadError {
        UploadError::Processing(anyhow::anyhow!("disk full"))
    }

    async fn panicking_upload() -> StatusCode {
        panic!("render farm on fire")
    }

    async fn errors_logged_for(path: &str) -> (StatusCode, usize) {
        let counter = ErrorCounter::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(counter.clone()));

        let app = Router::new()
            .route("/fail", get(failing_upload))
            .route("/panic", get(panicking_upload))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(axum::middleware::from_fn(log_request_errors));
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        (response.status(), counter.0.load(Ordering::SeqCst))
    }

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_panic_message_is_reported() {
        let response = handle_panic(Box::new("decoder exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await["error"], "decoder exploded");

        let response = handle_panic(Box::new(String::from("out of frames")));
        assert_eq!(body_of(response).await["error"], "out of frames");
    }

    #[tokio::test]
    async fn test_opaque_panic_uses_fallback() {
        let response = handle_panic(Box::new(42_u32));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await["error"], UNEXPECTED_ERROR);
    }

    #[tokio::test]
    async fn test_server_errors_are_logged_once() {
        let (status, errors) = errors_logged_for("/fail").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(errors, 1);

        let (status, errors) = errors_logged_for("/panic").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(errors, 1);
    }
}
