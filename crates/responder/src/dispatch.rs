//! Command dispatcher: maps one command byte to exactly one handler.

use std::path::PathBuf;

use tracing::{debug, warn};

use linehaul_protocol::{Command, Digest, PACKET_SIZE, Reply, Status};
use linehaul_transfer::{Download, FsSessionStore, SessionStore, TransferError, Upload};

/// The responder's command surface: one download machine, one upload machine,
/// and a closed dispatch table over [`Command`].
pub struct Responder<S> {
    download: Download<S>,
    upload: Upload<S>,
}

impl Responder<FsSessionStore> {
    /// Responder with session records and the upload staging file under
    /// `root`.
    pub fn with_fs_store(root: impl Into<PathBuf>) -> Result<Self, TransferError> {
        let store = FsSessionStore::new(root)?;
        let staging = store.root().join("upload.partial");
        Ok(Self::new(store, staging))
    }
}

impl<S: SessionStore + Clone> Responder<S> {
    /// `staging` is the file where upload bytes accumulate until finalize.
    pub fn new(store: S, staging: impl Into<PathBuf>) -> Self {
        Self {
            download: Download::new(store.clone()),
            upload: Upload::new(store, staging),
        }
    }

    /// Routes one raw command to its handler and returns the handler's reply
    /// untouched.
    ///
    /// An unknown command byte (0 is reserved) never reaches a handler and
    /// never mutates persisted state; it is answered with the catch-all
    /// failure status.
    pub fn dispatch(&self, command_byte: u8, payload: &[u8]) -> Reply {
        let Some(command) = Command::from_byte(command_byte) else {
            warn!(command_byte, "unknown command byte");
            return Reply::empty(Status::FileIo);
        };
        debug!(?command, payload_len = payload.len(), "dispatching command");
        match command {
            Command::StartDownload => self.start_download(payload),
            Command::StartUpload => self.start_upload(payload),
            Command::RequestPacket => self.request_packet(),
            Command::SendPacket => self.send_packet(payload),
            Command::CancelUpload => self.cancel_upload(),
            Command::CancelDownload => self.cancel_download(),
            Command::FinalizeUpload => self.finalize_upload(payload),
        }
    }

    fn start_download(&self, payload: &[u8]) -> Reply {
        let Ok(path) = std::str::from_utf8(payload) else {
            warn!("start-download payload is not valid UTF-8");
            return Reply::empty(Status::FileIo);
        };
        match self.download.start(path) {
            Ok(frame) => Reply::ok(frame.encode_body().to_vec()),
            Err(e) => failure("start-download", &e),
        }
    }

    fn start_upload(&self, payload: &[u8]) -> Reply {
        let Some(expected) = Digest::from_slice(payload) else {
            warn!(len = payload.len(), "start-upload payload is not a 32-byte digest");
            return Reply::empty(Status::FileIo);
        };
        match self.upload.start(expected) {
            Ok(()) => Reply::empty(Status::Success),
            Err(e) => failure("start-upload", &e),
        }
    }

    fn request_packet(&self) -> Reply {
        match self.download.next_packet() {
            Ok(data) => Reply::ok(data),
            Err(e) => failure("request-packet", &e),
        }
    }

    fn send_packet(&self, payload: &[u8]) -> Reply {
        if payload.len() > PACKET_SIZE {
            warn!(len = payload.len(), "send-packet payload exceeds packet ceiling");
            return Reply::empty(Status::FileIo);
        }
        match self.upload.accept_packet(payload) {
            Ok(()) => Reply::empty(Status::Success),
            Err(e) => failure("send-packet", &e),
        }
    }

    fn cancel_upload(&self) -> Reply {
        match self.upload.cancel() {
            Ok(()) => Reply::empty(Status::Success),
            Err(e) => failure("cancel-upload", &e),
        }
    }

    fn cancel_download(&self) -> Reply {
        match self.download.cancel() {
            Ok(()) => Reply::empty(Status::Success),
            Err(e) => failure("cancel-download", &e),
        }
    }

    fn finalize_upload(&self, payload: &[u8]) -> Reply {
        let Ok(destination) = std::str::from_utf8(payload) else {
            warn!("finalize-upload payload is not valid UTF-8");
            return Reply::empty(Status::FileIo);
        };
        match self.upload.finalize(destination) {
            Ok(()) => Reply::empty(Status::Success),
            Err(e) => failure("finalize-upload", &e),
        }
    }
}

fn failure(op: &str, err: &TransferError) -> Reply {
    debug!(op, %err, "command failed");
    Reply::empty(err.reply_status())
}
