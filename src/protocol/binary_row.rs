//! Binary protocol result-row parsing.

use crate::error::{protocol_err, Result};
use crate::io::{row_bitmap_get, row_bitmap_len, PacketReader};
use crate::protocol::column_def::ColumnDefinition;
use crate::value::{read_binary_column, MySqlColumnValue};

/// Decode one row packet. `payload` includes the leading `0x00` marker
/// byte that always starts a binary-protocol row.
pub fn decode_row(payload: &[u8], columns: &[ColumnDefinition]) -> Result<Vec<MySqlColumnValue>> {
    let mut r = PacketReader::new(payload);

    let header = r.u8()?;
    if header != 0x00 {
        return Err(protocol_err!(
            "expected binary row marker 0x00; received 0x{:X}",
            header
        ));
    }

    let bitmap_len = row_bitmap_len(columns.len());
    let bitmap = r.bytes(bitmap_len)?;

    let mut values = Vec::with_capacity(columns.len());
    for (i, col) in columns.iter().enumerate() {
        if row_bitmap_get(bitmap, i) {
            values.push(MySqlColumnValue::Null);
        } else {
            values.push(read_binary_column(&mut r, col.column_type, col.is_unsigned())?);
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{row_bitmap_set, PacketBuilder};
    use crate::protocol::ColumnType;

    fn column(column_type: ColumnType, unsigned: bool) -> ColumnDefinition {
        ColumnDefinition {
            catalog: "def".into(),
            schema: String::new(),
            table_alias: String::new(),
            table: String::new(),
            column_alias: String::new(),
            column: "c".into(),
            charset: 45,
            length: 0,
            column_type,
            flags: if unsigned { 0x0020 } else { 0 },
            decimals: 0,
        }
    }

    #[test]
    fn decodes_mixed_row_with_one_null() {
        let columns = vec![
            column(ColumnType::LONGLONG, false),
            column(ColumnType::VAR_STRING, false),
            column(ColumnType::DOUBLE, false),
        ];

        let mut bitmap = vec![0u8; row_bitmap_len(3)];
        row_bitmap_set(&mut bitmap, 1); // column 1 is NULL

        let mut b = PacketBuilder::new();
        b.u8(0x00);
        b.bytes(&bitmap);
        b.i64_le(42);
        // column 1 (NULL) contributes no bytes
        b.f64_le(1.25);

        let payload = b.into_vec();
        let row = decode_row(&payload, &columns).unwrap();

        assert_eq!(row[0], MySqlColumnValue::Signed(42));
        assert_eq!(row[1], MySqlColumnValue::Null);
        assert_eq!(row[2], MySqlColumnValue::Double(1.25));
    }
}
