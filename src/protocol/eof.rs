//! Legacy `EOF` packet: terminates column/row streams
//! unless `DEPRECATE_EOF` was negotiated, in which case an `OK` packet
//! (tag `0xFE`, length < 9) plays the same role.

use crate::error::{protocol_err, Result};
use crate::io::PacketReader;
use crate::protocol::StatusFlags;

#[derive(Debug)]
pub struct EofPacket {
    pub warnings: u16,
    pub status: StatusFlags,
}

impl EofPacket {
    /// `payload` includes the leading `0xFE` tag byte.
    pub fn read(payload: &[u8]) -> Result<Self> {
        let mut r = PacketReader::new(payload);

        let header = r.u8()?;
        if header != 0xFE {
            return Err(protocol_err!("expected EOF (0xFE); received 0x{:X}", header));
        }

        let warnings = r.u16_le()?;
        let status = StatusFlags::from_bits_truncate(r.u16_le()?);

        Ok(EofPacket { warnings, status })
    }

    /// Whether `payload` looks like a short-form EOF/OK packet: tag
    /// `0xFE` and total length under 9 bytes. This is the discriminant a
    /// `DEPRECATE_EOF` row stream's terminator is recognized by.
    pub fn looks_like_eof(payload: &[u8]) -> bool {
        payload.first() == Some(&0xFE) && payload.len() < 9
    }
}
