//! Handler shapes.
//!
//! # Design Decisions
//! - Every handler is stored as one async shape: it owns the response while
//!   it runs and hands it back together with its result
//! - The request is shared behind an `Arc` so a handler can hold it across
//!   `.await` points
//! - Synchronous closures are wrapped and run inline on the connection's
//!   task; anything that waits on I/O belongs in an async handler

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::error::Error;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::Captures;

/// What every handler returns.
pub type HandlerResult = Result<(), Error>;

/// The response a handler wrote, plus how it finished.
pub type Reply = (Response, HandlerResult);

/// Route handler: `(request, response, captures)`.
pub type Handler =
    Arc<dyn Fn(Arc<Request>, Response, Captures) -> BoxFuture<'static, Reply> + Send + Sync>;

/// Fallback invoked when no route matches: `(request, response)`.
pub type ErrorHandler = Arc<dyn Fn(Arc<Request>, Response) -> BoxFuture<'static, Reply> + Send + Sync>;

/// Wrap a synchronous route handler.
pub fn sync_handler<F>(f: F) -> Handler
where
    F: Fn(&Request, &mut Response, &Captures) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(
        move |req: Arc<Request>, mut res: Response, caps: Captures| -> BoxFuture<'static, Reply> {
            let result = f(&req, &mut res, &caps);
            future::ready((res, result)).boxed()
        },
    )
}

/// Wrap an async route handler.
pub fn async_handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Arc<Request>, Response, Captures) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    Arc::new(
        move |req: Arc<Request>, res: Response, caps: Captures| -> BoxFuture<'static, Reply> {
            f(req, res, caps).boxed()
        },
    )
}

/// Wrap a synchronous error handler.
pub fn sync_error_handler<F>(f: F) -> ErrorHandler
where
    F: Fn(&Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(move |req: Arc<Request>, mut res: Response| -> BoxFuture<'static, Reply> {
        let result = f(&req, &mut res);
        future::ready((res, result)).boxed()
    })
}

/// Wrap an async error handler.
pub fn async_error_handler<F, Fut>(f: F) -> ErrorHandler
where
    F: Fn(Arc<Request>, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    Arc::new(move |req: Arc<Request>, res: Response| -> BoxFuture<'static, Reply> {
        f(req, res).boxed()
    })
}
