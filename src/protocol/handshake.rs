//! The initial server greeting, protocol version 10.

use crate::error::{protocol_err, Result};
use crate::io::PacketReader;
use crate::protocol::{Capabilities, StatusFlags};

#[derive(Debug)]
pub struct Handshake {
    pub server_version: String,
    pub connection_id: u32,
    pub scramble: Vec<u8>,
    pub server_capabilities: Capabilities,
    pub charset: u8,
    pub status: StatusFlags,
    pub auth_plugin_name: Option<String>,
}

impl Handshake {
    pub fn read(payload: &[u8]) -> Result<Self> {
        let mut r = PacketReader::new(payload);

        let tag = r.u8()?;
        if tag != 0x0A {
            return Err(protocol_err!(
                "expected greeting tag 0x0A; received 0x{:X}",
                tag
            ));
        }

        let server_version = r.str_nul()?;
        let connection_id = r.u32_le()?;

        let mut scramble = Vec::with_capacity(20);
        scramble.extend_from_slice(r.bytes(8)?);

        r.skip(1)?; // filler 0x00

        let caps_lower = r.u16_le()?;
        let charset = r.u8()?;
        let status = StatusFlags::from_bits_truncate(r.u16_le()?);
        let caps_upper = r.u16_le()?;

        let capabilities = Capabilities::from_bits_truncate(
            u32::from(caps_lower) | (u32::from(caps_upper) << 16),
        );

        let auth_data_len = r.u8()?;
        r.skip(10)?; // reserved

        let auth_plugin_name = if r.remaining() > 0 {
            // scramble part 2: max(13, auth_data_len - 8), NUL-padded
            let len = (i32::from(auth_data_len) - 8).max(13) as usize;
            let part2 = r.bytes(len)?;
            // drop the trailing NUL pad byte that terminates the scramble
            scramble.extend_from_slice(&part2[..part2.len().saturating_sub(1)]);

            if r.remaining() > 0 {
                Some(r.str_nul()?)
            } else {
                None
            }
        } else {
            None
        };

        Ok(Handshake {
            server_version,
            connection_id,
            scramble,
            server_capabilities: capabilities,
            charset,
            status,
            auth_plugin_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANDSHAKE_MARIADB_10_4: &[u8] = b"\n5.5.5-10.4.7-MariaDB-1:10.4.7+maria~bionic\x00\x0b\x00\x00\x00t6L\\j\"dS\x00\xfe\xf7\x08\x02\x00\xff\x81\x15\x00\x00\x00\x00\x00\x00\x07\x00\x00\x00U14Oph9\"<H5n\x00mysql_native_password\x00";

    #[test]
    fn reads_mariadb_handshake() {
        let h = Handshake::read(HANDSHAKE_MARIADB_10_4).unwrap();
        assert_eq!(&h.server_version, "5.5.5-10.4.7-MariaDB-1:10.4.7+maria~bionic");
        assert_eq!(h.connection_id, 11);
        assert_eq!(h.auth_plugin_name.as_deref(), Some("mysql_native_password"));
        assert_eq!(h.scramble.len(), 20);
        assert!(h.server_capabilities.contains(Capabilities::PROTOCOL_41));
    }
}
