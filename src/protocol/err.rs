//! `ERR` packet parsing.

use crate::error::{protocol_err, Error, Result};
use crate::io::PacketReader;

#[derive(Debug)]
pub struct ErrPacket {
    pub code: u16,
    pub sql_state: String,
    pub message: String,
}

impl ErrPacket {
    /// `payload` includes the leading `0xFF` tag byte.
    pub fn read(payload: &[u8]) -> Result<Self> {
        let mut r = PacketReader::new(payload);

        let header = r.u8()?;
        if header != 0xFF {
            return Err(protocol_err!("expected ERR (0xFF); received 0x{:X}", header));
        }

        let code = r.u16_le()?;
        let _sql_state_marker = r.u8()?; // '#'
        let sql_state = r.str_fixed(5)?;
        let message = r.str_eof()?;

        Ok(ErrPacket {
            code,
            sql_state,
            message,
        })
    }

    pub fn into_error(self) -> Error {
        Error::Server {
            code: self.code,
            sql_state: self.sql_state,
            message: self.message,
        }
    }
}
