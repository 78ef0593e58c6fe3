//! `COM_QUERY`, used only for the literal transaction verbs:
//! `START TRANSACTION [READ ONLY]`, `COMMIT`, `ROLLBACK`. No text-protocol
//! result-row parsing is implemented.

use crate::io::PacketBuilder;

pub const COM_QUERY: u8 = 0x03;

pub fn encode(sql: &str) -> Vec<u8> {
    let mut b = PacketBuilder::new();
    b.u8(COM_QUERY);
    b.bytes(sql.as_bytes());
    b.into_vec()
}
