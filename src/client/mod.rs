//! The command serializer: owns the byte stream, the
//! per-command sequence counter, and the negotiated capability set, and
//! guarantees at most one command runs against the stream at a time.
//!
//! A natural design here would be an in-order single-consumer executor
//! that commands submit a closure to. Rust has no ergonomic way to pass a
//! closure that borrows the Client's internal state across `.await` points
//! without boxing every call site, so this crate realizes the same
//! guarantees differently: [`Client::begin_command`] returns a
//! [`CommandGuard`], an RAII handle on an owned `tokio::sync::Mutex` guard.
//! Holding the guard *is* "the closure's execution" — the mutex gives FIFO
//! single-consumer serialization. The bookkeeping that would otherwise run
//! at closure exit (sequence reset, poisoning on cancellation) lives on
//! `ClientState` itself rather than the guard: `poisoned` is set before the
//! guard is handed out and only cleared by [`CommandGuard::complete`], so a
//! guard dropped without completing (the caller's future was cancelled)
//! leaves the state poisoned for whoever locks it next.

mod executor;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::auth::compute_auth_response;
use crate::error::{protocol_err, Error, Result};
use crate::protocol::{Capabilities, HandshakeResponse, OkPacket, StatusFlags};

pub(crate) use executor::CommandGuard;

/// Anything this crate can drive the protocol over: a `TcpStream`, a
/// `UnixStream`, a TLS wrapper, or — in tests — a `tokio::io::DuplexStream`
/// half. Socket establishment is out of scope; the caller supplies one of
/// these already connected.
pub trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Stream for T {}

pub(crate) struct ClientState {
    stream: Box<dyn Stream>,
    /// `-1` is the idle sentinel.
    next_seq: i16,
    /// Set when a command begins, cleared only when it finishes without
    /// being cancelled. A guard dropped mid-command (the caller's future
    /// was cancelled) leaves this `true`, and the next command to observe
    /// it shuts the Client down rather than reuse a possibly-desynced
    /// stream.
    poisoned: bool,
    in_transaction: bool,
}

struct Shared {
    disposed: AtomicBool,
    capabilities: Capabilities,
}

/// A cheaply-cloneable handle to one connection's command serializer.
/// [`crate::connection::Connection`] owns one exclusively;
/// [`crate::statement::Statement`] holds a non-owning clone.
#[derive(Clone)]
pub struct Client {
    state: Arc<Mutex<ClientState>>,
    shared: Arc<Shared>,
}

impl Client {
    /// Perform the handshake and `mysql_native_password`/`mysql_clear_password`
    /// authentication over an already-opened stream.
    #[instrument(skip(stream, password))]
    pub async fn connect<S>(stream: S, username: &str, password: &str, charset: u8) -> Result<Client>
    where
        S: Stream + 'static,
    {
        let mut stream: Box<dyn Stream> = Box::new(stream);

        let (_seq, greeting) = crate::io::read_packet(&mut stream).await?;
        let handshake = crate::protocol::Handshake::read(&greeting)?;
        debug!(server_version = %handshake.server_version, "received server greeting");

        let capabilities = Capabilities::requested() & handshake.server_capabilities;

        let plugin = handshake
            .auth_plugin_name
            .as_deref()
            .unwrap_or("mysql_native_password");
        let auth_response = compute_auth_response(plugin, password, &handshake.scramble)?;

        let response = HandshakeResponse {
            capabilities,
            charset,
            username,
            auth_response: &auth_response,
            auth_plugin_name: Some(plugin),
        }
        .encode();

        let next_seq = crate::io::write_packet(&mut stream, 1, &response).await?;
        let (_seq, reply) = crate::io::read_packet(&mut stream).await?;

        match reply.first() {
            Some(0x00) => {}
            Some(0xFF) => return Err(crate::protocol::ErrPacket::read(&reply)?.into_error()),
            _ => {
                return Err(protocol_err!(
                    "expected handshake result OK (0x00) or ERR (0xFF); received {:?}",
                    reply.first()
                ))
            }
        }

        info!(capabilities = capabilities.bits(), "authenticated");

        let state = ClientState {
            stream,
            next_seq: i16::from(next_seq),
            poisoned: false,
            in_transaction: false,
        };

        Ok(Client {
            state: Arc::new(Mutex::new(state)),
            shared: Arc::new(Shared {
                disposed: AtomicBool::new(false),
                capabilities,
            }),
        })
    }

    pub fn capabilities(&self) -> Capabilities {
        self.shared.capabilities
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    /// Begin a command: acquire exclusive access to the stream — at most
    /// one command runs at a time, FIFO over concurrent waiters — and
    /// reset the sequence counter to its idle sentinel.
    pub(crate) async fn begin_command(&self) -> Result<CommandGuard> {
        executor::begin_command(self.state.clone(), &self.shared.disposed).await
    }

    /// `START TRANSACTION [READ ONLY]` / `COMMIT` / `ROLLBACK`, verifying
    /// the server's reported `IN_TRANS` bit matches the intended direction
    ///. Failure escalates to `shutdown`.
    #[instrument(skip(self))]
    pub async fn begin_transaction(&self, read_only: bool) -> Result<()> {
        let sql = if read_only {
            "START TRANSACTION READ ONLY"
        } else {
            "START TRANSACTION"
        };
        self.run_transaction_verb(sql, true).await
    }

    pub async fn commit(&self) -> Result<()> {
        self.run_transaction_verb("COMMIT", false).await
    }

    pub async fn roll_back(&self) -> Result<()> {
        self.run_transaction_verb("ROLLBACK", false).await
    }

    async fn run_transaction_verb(&self, sql: &str, expect_in_trans: bool) -> Result<()> {
        let result = self.run_transaction_verb_inner(sql, expect_in_trans).await;
        if let Err(ref e) = result {
            warn!(error = %e, verb = sql, "transaction verb failed; shutting client down");
            self.shutdown(Some(format!("transaction verb {sql:?} failed: {e}")))
                .await;
        }
        result
    }

    async fn run_transaction_verb_inner(&self, sql: &str, expect_in_trans: bool) -> Result<()> {
        let mut cmd = self.begin_command().await?;
        let result = Self::drive_transaction_verb(&mut cmd, sql, expect_in_trans, self.shared.capabilities).await;
        cmd.complete(result.as_ref().err().is_some_and(Error::is_fatal));
        result
    }

    async fn drive_transaction_verb(
        cmd: &mut CommandGuard,
        sql: &str,
        expect_in_trans: bool,
        capabilities: Capabilities,
    ) -> Result<()> {
        cmd.send_packet(&crate::protocol::com_query::encode(sql))
            .await?;
        let (tag, payload) = cmd.read_raw_packet().await?;
        let ok = match tag {
            0x00 | 0xFE => OkPacket::read(&payload, capabilities)?,
            0xFF => return Err(crate::protocol::ErrPacket::read(&payload)?.into_error()),
            other => {
                return Err(protocol_err!(
                    "expected OK/ERR in response to {sql:?}; received tag 0x{other:02X}"
                ))
            }
        };

        let in_trans = ok.status.contains(StatusFlags::SERVER_STATUS_IN_TRANS);
        if in_trans != expect_in_trans {
            return Err(protocol_err!(
                "server's IN_TRANS status ({in_trans}) disagrees with {sql:?}'s intent ({expect_in_trans})"
            ));
        }
        cmd.set_in_transaction(in_trans);
        Ok(())
    }

    pub(crate) async fn in_transaction(&self) -> bool {
        self.state.lock().await.in_transaction
    }

    /// Submit a no-op command and report whether the server still
    /// considers the connection to be inside a transaction. Used by the
    /// pool's release path to decide whether a returned client is fit for
    /// reuse. `COM_PING` is the cheapest such probe — its `OK` reply
    /// carries the same status flags a real command's would.
    pub(crate) async fn probe_in_transaction(&self) -> Result<bool> {
        let mut cmd = self.begin_command().await?;
        let result = Self::drive_probe(&mut cmd, self.shared.capabilities).await;
        cmd.complete(result.as_ref().err().is_some_and(Error::is_fatal));
        result
    }

    async fn drive_probe(cmd: &mut CommandGuard, capabilities: Capabilities) -> Result<bool> {
        cmd.send_packet(&crate::protocol::com_ping::encode()).await?;
        let (tag, payload) = cmd.read_raw_packet().await?;
        match tag {
            0x00 => {
                let ok = OkPacket::read(&payload, capabilities)?;
                let in_trans = ok.status.contains(StatusFlags::SERVER_STATUS_IN_TRANS);
                cmd.set_in_transaction(in_trans);
                Ok(in_trans)
            }
            0xFF => Err(crate::protocol::ErrPacket::read(&payload)?.into_error()),
            other => Err(protocol_err!(
                "expected OK in response to probe COM_PING; received tag 0x{other:02X}"
            )),
        }
    }

    /// Idempotent. Marks the Client disposed immediately (pending and
    /// future commands fail fast), waits for any in-flight command to
    /// drain, then closes the stream.
    #[instrument(skip(self))]
    pub async fn shutdown(&self, reason: Option<String>) {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(reason) = &reason {
            info!(reason, "shutting down client");
        } else {
            info!("shutting down client");
        }
        let mut state = self.state.lock().await;
        let _ = state.stream.shutdown().await;
    }
}
