//! `COM_PING`: a liveness probe answered with a plain `OK`.

use crate::io::PacketBuilder;

pub const COM_PING: u8 = 0x0E;

pub fn encode() -> Vec<u8> {
    let mut b = PacketBuilder::new();
    b.u8(COM_PING);
    b.into_vec()
}
