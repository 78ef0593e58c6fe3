//! The 32-bit capability mask, modeled as a typed bit set:
//! encoders and decoders branch on named capabilities, never raw bits.

bitflags::bitflags! {
    /// A subset of the full MySQL `CLIENT_*` capability flags — just the
    /// ones this crate negotiates or inspects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        const LONG_FLAG                      = 0x0000_0004;
        const CONNECT_WITH_DB                 = 0x0000_0008;
        const PROTOCOL_41                     = 0x0000_0200;
        const TRANSACTIONS                    = 0x0000_2000;
        const SECURE_CONNECTION                = 0x0000_8000;
        const MULTI_STATEMENTS                = 0x0001_0000;
        const MULTI_RESULTS                   = 0x0002_0000;
        const PLUGIN_AUTH                      = 0x0008_0000;
        const PLUGIN_AUTH_LENENC_CLIENT_DATA     = 0x0020_0000;
        const SESSION_TRACK                   = 0x0080_0000;
        const DEPRECATE_EOF                   = 0x0100_0000;
    }
}

impl Capabilities {
    /// The set this crate asks the server for.
    pub fn requested() -> Capabilities {
        Capabilities::LONG_FLAG
            | Capabilities::PROTOCOL_41
            | Capabilities::TRANSACTIONS
            | Capabilities::SECURE_CONNECTION
            | Capabilities::MULTI_RESULTS
            | Capabilities::MULTI_STATEMENTS
            | Capabilities::PLUGIN_AUTH
            | Capabilities::PLUGIN_AUTH_LENENC_CLIENT_DATA
            | Capabilities::SESSION_TRACK
            | Capabilities::DEPRECATE_EOF
    }
}
