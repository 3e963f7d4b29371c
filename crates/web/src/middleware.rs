//! Built-in middleware.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use http::StatusCode;
use tracing::{error, info};

use crate::Context;

/// Logs method, path, final status and elapsed time of every request.
pub fn logger() -> impl Fn(&mut Context) + Send + Sync + 'static {
    |ctx: &mut Context| {
        let start = Instant::now();
        ctx.next();
        info!(
            method = %ctx.method(),
            path = ctx.path(),
            status = ctx.status_code().as_u16(),
            elapsed = ?start.elapsed(),
            "request handled"
        );
    }
}

/// Turns a panic raised further down the chain into a `500` response.
pub fn recovery() -> impl Fn(&mut Context) + Send + Sync + 'static {
    |ctx: &mut Context| {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| ctx.next())) {
            error!(cause = panic_message(payload.as_ref()), path = ctx.path(), "handler panicked");
            ctx.fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
