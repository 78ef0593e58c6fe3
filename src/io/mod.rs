//! The framed packet codec: wire framing plus cursor-based
//! primitive readers/writers.

mod buf;
mod frame;

pub use buf::{
    param_bitmap_get, param_bitmap_len, param_bitmap_set, row_bitmap_get, row_bitmap_len,
    row_bitmap_set, LenEncInt, PacketBuilder, PacketReader,
};
pub use frame::{read_packet, write_packet};
