//! Pull-mode endpoint pair: the responder (command dispatcher + serve loop)
//! and the initiator (typed client).
//!
//! The protocol is strictly request/response with one outstanding operation:
//! the initiator writes one request frame, the responder executes exactly one
//! handler and writes one reply frame. Transfer state lives in
//! `linehaul-transfer`; this crate only moves frames and routes commands.

mod dispatch;
mod initiator;
mod server;

pub use dispatch::Responder;
pub use initiator::Initiator;
pub use server::serve;

use linehaul_protocol::Status;

/// Errors from driving the pull protocol over a link.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Frame(#[from] linehaul_protocol::FrameError),

    #[error("responder replied with status {0:?}")]
    Remote(Status),

    #[error("download delivered {got} bytes, start frame declared {expected}")]
    ShortDownload { expected: u64, got: u64 },

    #[error("whole-file digest mismatch after reassembly")]
    DigestMismatch,
}
