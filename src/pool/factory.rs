//! A pluggable way to produce a fresh authenticated [`Client`] on demand.
//!
//! There's no async-closure-as-trait-object support in the standard
//! library yet, so this uses the common hand-rolled pattern: an object-safe
//! trait with a manually-boxed future, implemented for any `Fn() -> Future`
//! closure. Callers pass a plain `|| async { ... }` closure; they never see
//! the boxing.

use std::future::Future;
use std::pin::Pin;

use crate::client::Client;
use crate::error::Result;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait ConnectFactory: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, Result<Client>>;
}

impl<F, Fut> ConnectFactory for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Client>> + Send + 'static,
{
    fn connect(&self) -> BoxFuture<'_, Result<Client>> {
        Box::pin((self)())
    }
}
