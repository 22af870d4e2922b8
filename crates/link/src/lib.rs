//! Push-mode endpoint pair for half-duplex links: a sender that streams the
//! start frame and packets, and a receiver that acknowledges each packet with
//! a control byte (`Next` to advance, `Again` to retransmit).
//!
//! Unlike the pull protocol in `linehaul-responder`, the sender drives the
//! transfer; the receiver only ever answers one control byte per packet, which
//! keeps the link half-duplex friendly.

mod receiver;
mod sender;

pub use receiver::{ReceiveReport, receive};
pub use sender::{SendReport, send};

/// Errors from driving a push transfer over a link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Frame(#[from] linehaul_protocol::FrameError),

    #[error("peer aborted the transfer")]
    PeerError,

    #[error("peer ended the transfer before the last packet")]
    PrematureEnd,

    #[error("resume packet {start} is past the end of the {total}-packet transfer")]
    BadResume { start: u64, total: u64 },

    #[error("received {got} bytes, start frame declared {expected}")]
    LengthMismatch { expected: u64, got: u64 },

    #[error("whole-file digest mismatch after reassembly")]
    DigestMismatch,
}
