//! `COM_STMT_PREPARE` request and its `_OK` response.

use crate::error::{protocol_err, Result};
use crate::io::{PacketBuilder, PacketReader};

pub const COM_STMT_PREPARE: u8 = 0x16;

/// Encode the prepare payload, optionally appending a literal
/// `LIMIT n [OFFSET k]` tail — the one query-rewrite this crate performs;
/// there is no query builder or AST here.
pub fn encode(sql: &str, limit: Option<u64>, offset: Option<u64>) -> Vec<u8> {
    let mut b = PacketBuilder::new();
    b.u8(COM_STMT_PREPARE);

    let mut text = String::from(sql);
    if let Some(limit) = limit {
        text.push_str(" LIMIT ");
        text.push_str(&limit.to_string());
        if let Some(offset) = offset {
            text.push_str(" OFFSET ");
            text.push_str(&offset.to_string());
        }
    }
    b.bytes(text.as_bytes());
    b.into_vec()
}

#[derive(Debug)]
pub struct PrepareOk {
    pub statement_id: u32,
    pub column_count: u16,
    pub param_count: u16,
    pub warning_count: u16,
}

impl PrepareOk {
    /// `payload` includes the leading status byte, which must be `0x00`
    /// (an `0xFF` ERR is handled by the caller *before* this is reached).
    pub fn read(payload: &[u8]) -> Result<Self> {
        let mut r = PacketReader::new(payload);

        let status = r.u8()?;
        if status != 0x00 {
            return Err(protocol_err!(
                "expected COM_STMT_PREPARE_OK status 0x00; received 0x{:X}",
                status
            ));
        }

        let statement_id = r.u32_le()?;
        let column_count = r.u16_le()?;
        let param_count = r.u16_le()?;
        r.skip(1)?; // filler
        let warning_count = r.u16_le()?;

        Ok(PrepareOk {
            statement_id,
            column_count,
            param_count,
            warning_count,
        })
    }
}

/// `COM_STMT_CLOSE`: no reply is sent by the server.
pub fn encode_close(statement_id: u32) -> Vec<u8> {
    let mut b = PacketBuilder::new();
    b.u8(0x19);
    b.u32_le(statement_id);
    b.into_vec()
}
