//! Wire protocol for linehaul file transfers.
//!
//! Everything here is a pure function over byte buffers: the command and
//! status vocabulary of the pull (request/reply) mode, the control bytes of
//! the push (streamed packet) mode, and the fixed-width frame layouts shared
//! by both. All integers on the wire are little-endian. No I/O happens in
//! this crate.

mod command;
mod digest;
mod frame;

pub use command::{Command, Control, Reply, Status};
pub use digest::Digest;
pub use frame::{
    FrameError, PACKET_HEADER_LEN, PacketHeader, REPLY_HEADER_LEN, REQUEST_HEADER_LEN,
    START_FRAME_LEN, StartFrame, TAG_PACKET, TAG_START, crc32, decode_packet,
    decode_reply_header, decode_request_header, encode_packet, encode_reply, encode_request,
};

/// Maximum payload bytes in one packet (2^15).
pub const PACKET_SIZE: usize = 0x8000;

/// Number of packets needed to carry `len` payload bytes.
pub fn packet_count(len: u64) -> u64 {
    let psize = PACKET_SIZE as u64;
    len / psize + if len % psize == 0 { 0 } else { 1 }
}
