//! The connection pool: capacity accounting, an idle queue,
//! demand-driven creation, transaction-state detection on release, and
//! fault-triggered eviction.
//!
//! "Active counter + idle queue + FIFO waiters" is realized here with a
//! [`tokio::sync::Semaphore`] sized to `pool.size`: a permit *is* one unit
//! of the active count, acquiring one is demand-driven creation admission
//! control, and Tokio's semaphore already wakes waiters in FIFO order —
//! there is no separate counter to keep in sync with it.

mod factory;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{info, instrument, warn};

pub use factory::ConnectFactory;

use crate::client::Client;
use crate::connection::ping_client;
use crate::error::{Error, Result};
use crate::options::PoolOptions;
use crate::statement::Statement;

struct PoolInner {
    semaphore: Arc<Semaphore>,
    idle: Mutex<VecDeque<Client>>,
    disposed: AtomicBool,
    factory: Box<dyn ConnectFactory>,
    options: PoolOptions,
}

/// An allocator of up to `options.size` [`Client`]s, created on demand and
/// reused via an idle queue.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    pub fn new<F>(factory: F, options: PoolOptions) -> Pool
    where
        F: ConnectFactory + 'static,
    {
        Pool {
            inner: Arc::new(PoolInner {
                semaphore: Arc::new(Semaphore::new(options.size)),
                idle: Mutex::new(VecDeque::new()),
                disposed: AtomicBool::new(false),
                factory: Box::new(factory),
                options,
            }),
        }
    }

    fn disposed_error() -> Error {
        Error::Pool("pool is disposed".into())
    }

    /// Acquire a [`PooledConnection`].
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<PooledConnection> {
        if self.inner.disposed.load(Ordering::Acquire) {
            return Err(Self::disposed_error());
        }

        let permit = self
            .inner
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Self::disposed_error())?;

        if self.inner.disposed.load(Ordering::Acquire) {
            return Err(Self::disposed_error());
        }

        let existing = self.inner.idle.lock().await.pop_front();
        let client = match existing {
            Some(client) => client,
            None => self.inner.factory.connect().await?,
        };

        Ok(PooledConnection {
            client,
            prefetch: self.inner.options.client.statement_prefetch,
            permit: Some(permit),
            pool: Arc::downgrade(&self.inner),
            disposed: false,
        })
    }

    /// Returns a [`PooledStatement`] that lazily checks out a client on its
    /// first `execute`.
    pub fn prepare(&self, sql: impl Into<String>) -> PooledStatement {
        PooledStatement::new(self.clone(), sql.into())
    }

    /// Marks the pool disposed (new checkouts and prepares fail) and
    /// closes every currently-idle client. Idempotent.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("shutting down pool");
        let idle: Vec<Client> = self.inner.idle.lock().await.drain(..).collect();
        for client in idle {
            client.shutdown(Some("pool shut down".into())).await;
        }
    }
}

/// A [`Client`] on loan from a [`Pool`]. Exposes the same command surface
/// as [`crate::connection::Connection`]; its `shutdown` releases the
/// client back to the pool instead of closing it outright, unless release
/// determines the client is unfit for reuse.
pub struct PooledConnection {
    client: Client,
    prefetch: usize,
    permit: Option<OwnedSemaphorePermit>,
    pool: Weak<PoolInner>,
    disposed: bool,
}

impl PooledConnection {
    fn check_usable(&self) -> Result<()> {
        if self.disposed {
            return Err(Error::usage("connection is disposed"));
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<u64> {
        self.check_usable()?;
        ping_client(&self.client).await
    }

    pub fn prepare(&self, sql: impl Into<String>) -> Result<Statement> {
        self.check_usable()?;
        Ok(Statement::new(self.client.clone(), sql, self.prefetch))
    }

    pub async fn begin_transaction(&self, read_only: bool) -> Result<()> {
        self.check_usable()?;
        self.client.begin_transaction(read_only).await
    }

    pub async fn commit(&self) -> Result<()> {
        self.check_usable()?;
        self.client.commit().await
    }

    pub async fn roll_back(&self) -> Result<()> {
        self.check_usable()?;
        self.client.roll_back().await
    }

    /// Idempotent. `reason.is_some()` signals the caller observed a
    /// failure and the client should be evicted rather than reused.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self, reason: Option<String>) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let permit = self.permit.take();
        release(&self.pool, self.client.clone(), permit, reason).await;
    }
}

/// The release closure invoked when a loaned client returns.
async fn release(
    pool: &Weak<PoolInner>,
    client: Client,
    permit: Option<OwnedSemaphorePermit>,
    caller_failure: Option<String>,
) {
    let Some(inner) = pool.upgrade() else {
        client.shutdown(caller_failure).await;
        return;
    };

    let pool_disposed = inner.disposed.load(Ordering::Acquire);

    if caller_failure.is_some() || pool_disposed || client.is_disposed() {
        client
            .shutdown(caller_failure.or_else(|| Some("evicted on release".into())))
            .await;
        drop(permit);
        return;
    }

    if client.in_transaction().await {
        let still_in_transaction = match client.probe_in_transaction().await {
            Ok(in_trans) => in_trans,
            Err(_) => true,
        };
        if still_in_transaction {
            warn!("evicting client released while still in a transaction");
            client
                .shutdown(Some("released while still in a transaction".into()))
                .await;
            drop(permit);
            return;
        }
    }

    inner.idle.lock().await.push_back(client);
    drop(permit);
}

/// A statement that lazily acquires a [`PooledConnection`] on its first
/// `execute`. Disposing releases the client back to the pool.
pub struct PooledStatement {
    pool: Pool,
    sql: String,
    limit: Option<u64>,
    offset: Option<u64>,
    bound: Vec<crate::value::MySqlValue>,
    connection: Option<PooledConnection>,
    statement: Option<Statement>,
    disposed: bool,
}

impl PooledStatement {
    fn new(pool: Pool, sql: String) -> Self {
        PooledStatement {
            pool,
            sql,
            limit: None,
            offset: None,
            bound: Vec::new(),
            connection: None,
            statement: None,
            disposed: false,
        }
    }

    pub fn limit(&mut self, n: u64) -> Result<&mut Self> {
        self.limit = Some(n);
        if let Some(stmt) = self.statement.as_mut() {
            stmt.limit(n)?;
        }
        Ok(self)
    }

    pub fn offset(&mut self, k: u64) -> Result<&mut Self> {
        self.offset = Some(k);
        if let Some(stmt) = self.statement.as_mut() {
            stmt.offset(k)?;
        }
        Ok(self)
    }

    pub fn bind(
        &mut self,
        index: usize,
        value: impl Into<crate::value::MySqlValue>,
    ) -> Result<&mut Self> {
        let value = value.into();
        if self.bound.len() <= index {
            self.bound.resize(index + 1, crate::value::MySqlValue::Null);
        }
        self.bound[index] = value.clone();
        if let Some(stmt) = self.statement.as_mut() {
            stmt.bind(index, value)?;
        }
        Ok(self)
    }

    async fn ensure_statement(&mut self) -> Result<&mut Statement> {
        if self.statement.is_none() {
            let connection = self.pool.checkout().await?;
            let mut statement = connection.prepare(self.sql.clone())?;
            if let Some(limit) = self.limit {
                statement.limit(limit)?;
            }
            if let Some(offset) = self.offset {
                statement.offset(offset)?;
            }
            for (i, v) in self.bound.iter().cloned().enumerate() {
                statement.bind(i, v)?;
            }
            self.connection = Some(connection);
            self.statement = Some(statement);
        }
        Ok(self.statement.as_mut().expect("just ensured"))
    }

    pub async fn execute(&mut self) -> Result<crate::result_set::ResultSet> {
        if self.disposed {
            return Err(Error::usage("statement is disposed"));
        }
        let result = self.ensure_statement().await?.execute().await;
        if let Err(ref e) = result {
            if e.is_fatal() {
                if let Some(mut connection) = self.connection.take() {
                    connection.shutdown(Some(e.to_string())).await;
                }
                self.statement = None;
            }
        }
        result
    }

    /// Releases the checked-out connection back to the pool, if one was
    /// ever acquired.
    pub async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        if let Some(mut statement) = self.statement.take() {
            statement.dispose().await?;
        }
        if let Some(mut connection) = self.connection.take() {
            connection.shutdown(None).await;
        }
        Ok(())
    }
}
