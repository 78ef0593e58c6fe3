//! Wire packet types: the handshake greeting, `OK`/`ERR`/`EOF`, column
//! definitions, and the prepared-statement command family.

mod binary_row;
mod capabilities;
mod column_def;
mod column_type;
pub mod com_ping;
pub mod com_query;
pub mod com_stmt_execute;
pub mod com_stmt_prepare;
mod eof;
mod err;
mod handshake;
mod handshake_response;
mod ok;
mod status;

pub use binary_row::decode_row;
pub use capabilities::Capabilities;
pub use column_def::ColumnDefinition;
pub use column_type::ColumnType;
pub use eof::EofPacket;
pub use err::ErrPacket;
pub use handshake::Handshake;
pub use handshake_response::HandshakeResponse;
pub use ok::OkPacket;
pub use status::StatusFlags;
