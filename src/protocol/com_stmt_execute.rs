//! `COM_STMT_EXECUTE` request encoding.

use crate::io::{param_bitmap_len, param_bitmap_set, PacketBuilder};
use crate::value::MySqlValue;

pub const COM_STMT_EXECUTE: u8 = 0x17;

/// Cursor flag byte; this crate only ever sends `NO_CURSOR`.
const CURSOR_TYPE_NO_CURSOR: u8 = 0x00;

pub fn encode(statement_id: u32, params: &[MySqlValue]) -> Vec<u8> {
    let mut b = PacketBuilder::new();

    b.u8(COM_STMT_EXECUTE);
    b.u32_le(statement_id);
    b.u8(CURSOR_TYPE_NO_CURSOR);
    b.u32_le(1); // iteration count, always 1

    if params.is_empty() {
        return b.into_vec();
    }

    let mut bitmap = vec![0u8; param_bitmap_len(params.len())];
    for (i, v) in params.iter().enumerate() {
        if matches!(v, MySqlValue::Null) {
            param_bitmap_set(&mut bitmap, i);
        }
    }
    b.bytes(&bitmap);
    // Always (re-)send parameter types; we never rely on the server
    // remembering a previous bind, so the "new params bound" flag is
    // unconditionally 1.
    b.u8(1);

    for v in params {
        let (type_id, unsigned, _) = v.wire_encoding();
        b.u8(type_id.0);
        b.u8(if unsigned { 0x80 } else { 0x00 });
    }

    for v in params {
        if let (_, _, Some(body)) = v.wire_encoding() {
            b.bytes(&body);
        }
    }

    b.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::param_bitmap_get;

    #[test]
    fn null_param_sets_bitmap_bit_and_has_no_body() {
        let params = vec![MySqlValue::Null, MySqlValue::Int(7)];
        let bytes = encode(1, &params);

        // header: tag(1) + stmt_id(4) + cursor(1) + iterations(4) = 10
        let bitmap_len = param_bitmap_len(2);
        let bitmap = &bytes[10..10 + bitmap_len];
        assert!(param_bitmap_get(bitmap, 0));
        assert!(!param_bitmap_get(bitmap, 1));
    }
}
