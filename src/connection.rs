//! The command façade over one [`Client`]: `ping`, statement
//! factory, transaction verbs, idempotent disposal.

use std::time::Instant;

use tracing::instrument;

use crate::client::{Client, CommandGuard, Stream};
use crate::error::{protocol_err, Error, Result};
use crate::options::ClientOptions;
use crate::protocol::{self, Capabilities, ErrPacket, OkPacket};
use crate::statement::Statement;

pub struct Connection {
    client: Client,
    prefetch: usize,
    disposed: bool,
}

impl Connection {
    /// Perform the handshake/auth over an already-opened stream and wrap
    /// the resulting [`Client`] (socket establishment is out of scope; the
    /// caller supplies the stream).
    #[instrument(skip(stream, password, options))]
    pub async fn connect<S>(
        stream: S,
        username: &str,
        password: &str,
        options: &ClientOptions,
    ) -> Result<Connection>
    where
        S: Stream + 'static,
    {
        let client = Client::connect(stream, username, password, options.charset).await?;
        Ok(Connection::from_client(client, options.statement_prefetch))
    }

    pub(crate) fn from_client(client: Client, prefetch: usize) -> Self {
        Connection {
            client,
            prefetch,
            disposed: false,
        }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    fn check_usable(&self) -> Result<()> {
        if self.disposed {
            return Err(Error::usage("connection is disposed"));
        }
        Ok(())
    }

    /// Sends `COM_PING` and returns the round-trip time.
    #[instrument(skip(self))]
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

    /// Idempotent; once called, every other method rejects with a usage
    /// error.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self, reason: Option<String>) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.client.shutdown(reason).await;
    }
}

/// Shared by [`Connection::ping`] and [`crate::pool::PooledConnection::ping`]:
/// send `COM_PING`, require a plain `OK`, and time the round trip.
pub(crate) async fn ping_client(client: &Client) -> Result<u64> {
    let start = Instant::now();

    let mut cmd = client.begin_command().await?;
    let result = drive_ping(&mut cmd, client.capabilities()).await;
    cmd.complete(result.as_ref().err().is_some_and(Error::is_fatal));
    result?;

    Ok(start.elapsed().as_millis() as u64)
}

async fn drive_ping(cmd: &mut CommandGuard, capabilities: Capabilities) -> Result<()> {
    cmd.send_packet(&protocol::com_ping::encode()).await?;
    let (tag, payload) = cmd.read_raw_packet().await?;
    match tag {
        0x00 => {
            OkPacket::read(&payload, capabilities)?;
            Ok(())
        }
        0xFF => Err(ErrPacket::read(&payload)?.into_error()),
        other => Err(protocol_err!(
            "expected OK in response to COM_PING; received tag 0x{other:02X}"
        )),
    }
}
