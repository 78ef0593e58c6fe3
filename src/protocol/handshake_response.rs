//! The client's handshake response.

use crate::io::PacketBuilder;
use crate::protocol::Capabilities;

pub struct HandshakeResponse<'a> {
    pub capabilities: Capabilities,
    pub charset: u8,
    pub username: &'a str,
    pub auth_response: &'a [u8],
    pub auth_plugin_name: Option<&'a str>,
}

impl HandshakeResponse<'_> {
    pub fn encode(&self) -> Vec<u8> {
        let mut b = PacketBuilder::new();

        b.u32_le(self.capabilities.bits());
        b.u32_le(0x00FF_FFFF); // max packet size
        b.u8(self.charset);
        b.bytes(&[0u8; 23]);
        b.str_nul(self.username);

        if self
            .capabilities
            .contains(Capabilities::PLUGIN_AUTH_LENENC_CLIENT_DATA)
        {
            b.lenenc_bytes(self.auth_response);
        } else if self.capabilities.contains(Capabilities::SECURE_CONNECTION) {
            b.u8(self.auth_response.len() as u8);
            b.bytes(self.auth_response);
        } else {
            b.bytes(self.auth_response);
            b.u8(0);
        }

        if self.capabilities.contains(Capabilities::PLUGIN_AUTH) {
            b.str_nul(self.auth_plugin_name.unwrap_or("mysql_native_password"));
        }

        b.into_vec()
    }
}
