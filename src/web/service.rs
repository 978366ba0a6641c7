//! Tower service wrapper for the bridge handler

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use tower::Service;

use crate::web::handlers::BridgeHandler;

/// Tower service that hands every request to [`BridgeHandler`]
#[derive(Clone)]
pub struct BridgeService {
    handler: Arc<BridgeHandler>,
}

impl BridgeService {
    pub fn new(handler: Arc<BridgeHandler>) -> Self {
        Self { handler }
    }
}

impl<B> Service<Request<B>> for BridgeService
where
    B: Send + 'static,
{
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let handler = self.handler.clone();

        Box::pin(async move { handler.handle_request(req).await })
    }
}
