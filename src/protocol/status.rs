//! Server status flags carried on `OK`/`EOF` packets.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u16 {
        const SERVER_STATUS_IN_TRANS          = 0x0001;
        const SERVER_STATUS_AUTOCOMMIT        = 0x0002;
        const SERVER_MORE_RESULTS_EXISTS      = 0x0008;
        const SERVER_SESSION_STATE_CHANGED    = 0x4000;
    }
}
