//! Command bytes, reply statuses, and push-mode control bytes.

/// Command bytes issued by the initiator, one per request.
///
/// Byte 0 is reserved/invalid and never maps to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    StartDownload = 1,
    StartUpload = 2,
    RequestPacket = 3,
    SendPacket = 4,
    CancelUpload = 5,
    CancelDownload = 6,
    FinalizeUpload = 7,
}

impl Command {
    /// Maps a raw wire byte to a command.
    ///
    /// Returns `None` for byte 0 and anything unrecognized, so the caller can
    /// reject the request without routing it to a handler.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::StartDownload),
            2 => Some(Self::StartUpload),
            3 => Some(Self::RequestPacket),
            4 => Some(Self::SendPacket),
            5 => Some(Self::CancelUpload),
            6 => Some(Self::CancelDownload),
            7 => Some(Self::FinalizeUpload),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Reply status codes returned by the responder, one per reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Success = 0,
    FileIo = 1,
    FileDoesntExist = 2,
    AlreadyDownloading = 3,
    AlreadyUploading = 4,
    NotDownloading = 5,
    NotUploading = 6,
    DownloadOver = 7,
    ShasumMismatch = 8,
}

impl Status {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Success),
            1 => Some(Self::FileIo),
            2 => Some(Self::FileDoesntExist),
            3 => Some(Self::AlreadyDownloading),
            4 => Some(Self::AlreadyUploading),
            5 => Some(Self::NotDownloading),
            6 => Some(Self::NotUploading),
            7 => Some(Self::DownloadOver),
            8 => Some(Self::ShasumMismatch),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Single-byte control replies of the push protocol.
///
/// Values 1 and 2 of the same wire table are the start/packet frame tags
/// ([`TAG_START`](crate::TAG_START), [`TAG_PACKET`](crate::TAG_PACKET)); the
/// remaining four are the receiver's per-packet verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Control {
    /// Packet accepted, send the next one.
    Next = 3,
    /// CRC mismatch, retransmit the same packet.
    Again = 4,
    /// Transfer finished.
    End = 5,
    /// Unrecoverable failure on the peer.
    Error = 6,
}

impl Control {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            3 => Some(Self::Next),
            4 => Some(Self::Again),
            5 => Some(Self::End),
            6 => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// One typed reply: a status plus an optional payload.
///
/// Constructed fresh per command invocation; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,
    pub payload: Vec<u8>,
}

impl Reply {
    /// A success reply carrying `payload`.
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            status: Status::Success,
            payload,
        }
    }

    /// A payload-free reply with the given status.
    pub fn empty(status: Status) -> Self {
        Self {
            status,
            payload: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes_match_wire_table() {
        assert_eq!(Command::StartDownload.as_byte(), 1);
        assert_eq!(Command::StartUpload.as_byte(), 2);
        assert_eq!(Command::RequestPacket.as_byte(), 3);
        assert_eq!(Command::SendPacket.as_byte(), 4);
        assert_eq!(Command::CancelUpload.as_byte(), 5);
        assert_eq!(Command::CancelDownload.as_byte(), 6);
        assert_eq!(Command::FinalizeUpload.as_byte(), 7);
    }

    #[test]
    fn command_roundtrip() {
        for byte in 1..=7 {
            let cmd = Command::from_byte(byte).unwrap();
            assert_eq!(cmd.as_byte(), byte);
        }
    }

    #[test]
    fn command_zero_is_reserved() {
        assert!(Command::from_byte(0).is_none());
    }

    #[test]
    fn command_unknown_bytes_rejected() {
        assert!(Command::from_byte(8).is_none());
        assert!(Command::from_byte(255).is_none());
    }

    #[test]
    fn status_roundtrip() {
        for byte in 0..=8 {
            let status = Status::from_byte(byte).unwrap();
            assert_eq!(status.as_byte(), byte);
        }
        assert!(Status::from_byte(9).is_none());
    }

    #[test]
    fn control_bytes_match_wire_table() {
        assert_eq!(Control::Next.as_byte(), 3);
        assert_eq!(Control::Again.as_byte(), 4);
        assert_eq!(Control::End.as_byte(), 5);
        assert_eq!(Control::Error.as_byte(), 6);
        // 1 and 2 are frame tags, not control replies.
        assert!(Control::from_byte(1).is_none());
        assert!(Control::from_byte(2).is_none());
    }

    #[test]
    fn reply_constructors() {
        let ok = Reply::ok(vec![1, 2, 3]);
        assert!(ok.is_success());
        assert_eq!(ok.payload, vec![1, 2, 3]);

        let err = Reply::empty(Status::DownloadOver);
        assert!(!err.is_success());
        assert!(err.payload.is_empty());
    }
}
