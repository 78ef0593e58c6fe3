//! Column-definition packet.

use crate::error::{protocol_err, Result};
use crate::io::PacketReader;
use crate::protocol::ColumnType;

#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub catalog: String,
    pub schema: String,
    pub table_alias: String,
    pub table: String,
    pub column_alias: String,
    pub column: String,
    pub charset: u16,
    pub length: u32,
    pub column_type: ColumnType,
    pub flags: u16,
    pub decimals: u8,
}

impl ColumnDefinition {
    /// The name callers see: the alias if present, else the underlying
    /// column name.
    pub fn name(&self) -> &str {
        if self.column_alias.is_empty() {
            &self.column
        } else {
            &self.column_alias
        }
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags & 0x0020 != 0
    }

    pub fn read(payload: &[u8]) -> Result<Self> {
        let mut r = PacketReader::new(payload);

        let catalog = r.str_lenenc()?.unwrap_or_default();
        let schema = r.str_lenenc()?.unwrap_or_default();
        let table_alias = r.str_lenenc()?.unwrap_or_default();
        let table = r.str_lenenc()?.unwrap_or_default();
        let column_alias = r.str_lenenc()?.unwrap_or_default();
        let column = r.str_lenenc()?.unwrap_or_default();

        let fixed_len = r.lenenc_int_header()?;
        if fixed_len != 0x0C {
            return Err(protocol_err!(
                "expected fixed-fields length 0x0C; received {:#x}",
                fixed_len
            ));
        }

        let charset = r.u16_le()?;
        let length = r.u32_le()?;
        let column_type = ColumnType(r.u8()?);
        let flags = r.u16_le()?;
        let decimals = r.u8()?;
        r.skip(2)?; // filler

        Ok(ColumnDefinition {
            catalog,
            schema,
            table_alias,
            table,
            column_alias,
            column,
            charset,
            length,
            column_type,
            flags,
            decimals,
        })
    }
}
