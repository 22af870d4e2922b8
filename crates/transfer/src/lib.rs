//! Transfer core: checksum engines, durable session records, and the
//! download/upload state machines.
//!
//! Nothing in this crate touches the link. The responder feeds it decoded
//! command payloads; it reads and writes local files and the session store,
//! and reports outcomes as typed results.

pub mod checksum;
mod download;
mod store;
mod upload;

pub use download::Download;
pub use store::{Direction, FsSessionStore, MemorySessionStore, SessionStore, TransferDescriptor};
pub use upload::Upload;

use linehaul_protocol::Status;

/// Errors produced by the transfer core.
///
/// Every variant maps onto exactly one wire status; no error here ever
/// corrupts a persisted descriptor.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file does not exist: {0}")]
    FileDoesntExist(String),

    #[error("a download is already in progress")]
    AlreadyDownloading,

    #[error("an upload is already in progress")]
    AlreadyUploading,

    #[error("no download in progress")]
    NotDownloading,

    #[error("no upload in progress")]
    NotUploading,

    #[error("download exhausted: all packets delivered")]
    DownloadOver,

    #[error("whole-file digest mismatch")]
    ShasumMismatch,

    #[error("corrupt session record: {0}")]
    CorruptRecord(String),
}

impl TransferError {
    /// The status byte a responder reports for this error.
    pub fn reply_status(&self) -> Status {
        match self {
            Self::Io(_) | Self::CorruptRecord(_) => Status::FileIo,
            Self::FileDoesntExist(_) => Status::FileDoesntExist,
            Self::AlreadyDownloading => Status::AlreadyDownloading,
            Self::AlreadyUploading => Status::AlreadyUploading,
            Self::NotDownloading => Status::NotDownloading,
            Self::NotUploading => Status::NotUploading,
            Self::DownloadOver => Status::DownloadOver,
            Self::ShasumMismatch => Status::ShasumMismatch,
        }
    }
}
