//! The transport seam between the client core and the service

use crate::error::Result;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by [`Transport::execute`]
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

/// Executes a single request against the audit service
///
/// `path` is relative to the service root (for example `v1/log`). The
/// returned value is the `result` member of a successful response; service
/// level failures are reported as [`crate::Error::Api`]. Timeouts and
/// cancellation are the implementation's concern.
pub trait Transport: Send + Sync {
    /// Send `payload` to `path` and return the response result
    fn execute<'a>(&'a self, path: &'a str, payload: Value) -> TransportFuture<'a>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute<'a>(&'a self, path: &'a str, payload: Value) -> TransportFuture<'a> {
        (**self).execute(path, payload)
    }
}

impl Transport for Box<dyn Transport> {
    fn execute<'a>(&'a self, path: &'a str, payload: Value) -> TransportFuture<'a> {
        (**self).execute(path, payload)
    }
}
