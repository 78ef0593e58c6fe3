//! Wire framing: `<length:3 LE><sequence:1><payload>`, including
//! multi-packet assembly for payloads that hit the 16 MiB boundary.
//! Sequence-number *bookkeeping* (the −1/command-boundary rules) lives in
//! [`crate::client`]; this module only knows how to turn bytes on the wire
//! into a `(sequence, payload)` pair and back.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// A payload of this exact length is not terminal; the next frame
/// continues it.
const MAX_PACKET_LEN: usize = 0x00FF_FFFF;

/// Read one logical packet, transparently reassembling a payload split
/// across multiple 16 MiB frames. Returns the sequence number of the
/// final (terminal) frame and the concatenated payload.
pub async fn read_packet<S>(stream: &mut S) -> Result<(u8, Vec<u8>)>
where
    S: AsyncRead + Unpin,
{
    let mut payload = Vec::new();
    let mut last_seq = 0u8;

    loop {
        let mut header = [0u8; 4];
        stream.read_exact(&mut header).await?;

        let len = u32::from(header[0]) | (u32::from(header[1]) << 8) | (u32::from(header[2]) << 16);
        let len = len as usize;
        last_seq = header[3];

        if len > 0 {
            let start = payload.len();
            payload.resize(start + len, 0);
            stream.read_exact(&mut payload[start..]).await?;
        }

        if len < MAX_PACKET_LEN {
            break;
        }
    }

    Ok((last_seq, payload))
}

/// Write one logical packet, splitting it into 16 MiB frames (with a
/// trailing empty frame if the payload is an exact multiple of the
/// boundary) and stamping each frame with an incrementing sequence
/// number starting at `seq`. Returns the sequence number to use for the
/// next outbound frame.
pub async fn write_packet<S>(stream: &mut S, seq: u8, payload: &[u8]) -> Result<u8>
where
    S: AsyncWrite + Unpin,
{
    let mut seq = seq;
    let mut offset = 0usize;

    loop {
        let remaining = payload.len() - offset;
        let chunk_len = remaining.min(MAX_PACKET_LEN);

        let header = [
            (chunk_len & 0xFF) as u8,
            ((chunk_len >> 8) & 0xFF) as u8,
            ((chunk_len >> 16) & 0xFF) as u8,
            seq,
        ];
        stream.write_all(&header).await?;
        stream
            .write_all(&payload[offset..offset + chunk_len])
            .await?;

        seq = seq.wrapping_add(1);
        offset += chunk_len;

        if chunk_len < MAX_PACKET_LEN {
            break;
        }
    }

    stream.flush().await?;
    Ok(seq)
}
