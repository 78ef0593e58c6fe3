//! The single-consumer serialization primitive backing [`super::Client`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::ClientState;
use crate::error::{protocol_err, Result};
use crate::protocol::ErrPacket;

/// Acquire exclusive access to the stream for one command.
///
/// Checks `disposed` both before queueing and after acquiring the lock, so
/// a Client shut down while a caller is waiting in line rejects that
/// caller instead of running its command. If the previous command's guard
/// was dropped without completing (its caller was cancelled mid-command),
/// `poisoned` is still `true`: protocol alignment is not guaranteed, so
/// this command is refused and the Client shut down rather than risk
/// reading garbage off a desynced stream.
pub(super) async fn begin_command(
    state: Arc<Mutex<ClientState>>,
    disposed: &AtomicBool,
) -> Result<CommandGuard> {
    if disposed.load(Ordering::Acquire) {
        return Err(disposed_error());
    }

    let mut guard = state.lock_owned().await;

    if disposed.load(Ordering::Acquire) {
        return Err(disposed_error());
    }

    if guard.poisoned {
        disposed.store(true, Ordering::Release);
        let _ = guard.stream.shutdown().await;
        return Err(protocol_err!(
            "client desynchronized by a previously cancelled command"
        ));
    }

    guard.poisoned = true;
    guard.next_seq = -1;

    Ok(CommandGuard { guard })
}

fn disposed_error() -> crate::error::Error {
    crate::error::Error::Usage("client is shut down".into())
}

/// Holding this guard *is* the in-flight command. `poisoned` is set before
/// the guard is handed out and only cleared by [`CommandGuard::complete`];
/// dropping the guard without calling it (the caller's future was
/// cancelled mid-command) leaves `poisoned` set in the underlying
/// `ClientState`, which the next [`begin_command`] treats as fatal.
pub(crate) struct CommandGuard {
    guard: OwnedMutexGuard<ClientState>,
}

impl CommandGuard {
    /// `sendPacket`: stamps and writes one logical packet,
    /// advancing the sequence counter.
    pub async fn send_packet(&mut self, payload: &[u8]) -> Result<()> {
        let seq = self.current_seq();
        let next = crate::io::write_packet(&mut self.guard.stream, seq, payload).await?;
        self.guard.next_seq = i16::from(next);
        Ok(())
    }

    /// `readRawPacket`: the next frame, unfiltered, with the
    /// tag byte still the first byte of the returned payload.
    pub async fn read_raw_packet(&mut self) -> Result<(u8, Vec<u8>)> {
        let (seq, payload) = crate::io::read_packet(&mut self.guard.stream).await?;
        let expected = self.current_seq();
        if seq != expected {
            return Err(protocol_err!(
                "packet sequence out of order: expected {expected}, received {seq}"
            ));
        }
        self.guard.next_seq = i16::from(seq.wrapping_add(1));
        let tag = *payload.first().unwrap_or(&0);
        Ok((tag, payload))
    }

    /// `readPacket(expected…)`: like [`Self::read_raw_packet`],
    /// but throws a parsed `ERR` as an error, enforces `tag ∈ expected`
    /// when non-empty, and peels the tag byte off the returned payload.
    pub async fn read_packet(&mut self, expected: &[u8]) -> Result<(u8, Vec<u8>)> {
        let (tag, payload) = self.read_raw_packet().await?;
        if tag == 0xFF {
            return Err(ErrPacket::read(&payload)?.into_error());
        }
        if !expected.is_empty() && !expected.contains(&tag) {
            return Err(protocol_err!("unexpected packet tag 0x{tag:02X}"));
        }
        Ok((tag, payload[1..].to_vec()))
    }

    pub fn set_in_transaction(&mut self, value: bool) {
        self.guard.in_transaction = value;
    }

    /// Record the outcome of the command: resets the sequence counter to
    /// the idle sentinel and clears `poisoned`, unless `fatal` — a fatal
    /// error already means the Client is being shut down, so there is
    /// nothing to un-poison.
    pub fn complete(self, fatal: bool) {
        if !fatal {
            let mut guard = self.guard;
            guard.poisoned = false;
            guard.next_seq = -1;
        }
    }

    fn current_seq(&self) -> u8 {
        if self.guard.next_seq < 0 {
            0
        } else {
            self.guard.next_seq as u8
        }
    }
}
