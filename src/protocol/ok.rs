//! `OK` / short-form `EOF` packet parsing.

use crate::error::{protocol_err, Result};
use crate::io::PacketReader;
use crate::protocol::{Capabilities, StatusFlags};

#[derive(Debug, Default)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status: StatusFlags,
    pub warnings: u16,
    pub info: String,
}

impl OkPacket {
    /// `payload` includes the leading `0x00`/`0xFE` tag byte.
    pub fn read(payload: &[u8], capabilities: Capabilities) -> Result<Self> {
        let mut r = PacketReader::new(payload);

        let header = r.u8()?;
        if header != 0x00 && header != 0xFE {
            return Err(protocol_err!(
                "expected OK (0x00) or short EOF-as-OK (0xFE); received 0x{:X}",
                header
            ));
        }

        let affected_rows = r.lenenc_int()?.value_or(0);
        let last_insert_id = r.lenenc_int()?.value_or(0);

        let mut status = StatusFlags::empty();
        let mut warnings = 0;

        if capabilities.contains(Capabilities::PROTOCOL_41) {
            status = StatusFlags::from_bits_truncate(r.u16_le()?);
            warnings = r.u16_le()?;
        }

        let info = if capabilities.contains(Capabilities::SESSION_TRACK) {
            let info = r.str_lenenc()?.unwrap_or_default();
            if status.contains(StatusFlags::SERVER_SESSION_STATE_CHANGED) {
                let _changes = r.str_lenenc()?;
            }
            info
        } else {
            r.str_eof()?
        };

        Ok(OkPacket {
            affected_rows,
            last_insert_id,
            status,
            warnings,
            info,
        })
    }
}

trait LenEncIntExt {
    fn value_or(self, default: u64) -> u64;
}

impl LenEncIntExt for crate::io::LenEncInt {
    fn value_or(self, default: u64) -> u64 {
        match self {
            crate::io::LenEncInt::Value(v) => v,
            crate::io::LenEncInt::Null => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_handshake_ok() {
        let payload = b"\x00\x00\x00\x02\x00\x00\x00";
        let ok = OkPacket::read(payload, Capabilities::PROTOCOL_41).unwrap();
        assert_eq!(ok.affected_rows, 0);
        assert_eq!(ok.last_insert_id, 0);
        assert!(ok.status.contains(StatusFlags::SERVER_STATUS_AUTOCOMMIT));
        assert_eq!(ok.warnings, 0);
    }
}
