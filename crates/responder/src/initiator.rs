//! Initiator-side client: issues commands and parses typed replies.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use linehaul_protocol::{
    Command, Digest, PACKET_SIZE, REPLY_HEADER_LEN, Reply, StartFrame, Status, decode_reply_header,
    encode_request,
};
use linehaul_transfer::checksum;

use crate::ResponderError;

/// Typed client for the pull protocol.
///
/// Each method writes exactly one request frame and reads exactly one reply,
/// preserving the one-outstanding-operation discipline.
pub struct Initiator<L> {
    link: L,
}

impl<L: AsyncRead + AsyncWrite + Unpin> Initiator<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }

    /// Consumes the client, handing the link back.
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Issues one command and reads the full reply, whatever its status.
    pub async fn call(&mut self, command: Command, payload: &[u8]) -> Result<Reply, ResponderError> {
        debug!(?command, payload_len = payload.len(), "issuing command");
        self.link
            .write_all(&encode_request(command, payload)?)
            .await?;
        self.link.flush().await?;

        let mut header = [0u8; REPLY_HEADER_LEN];
        self.link.read_exact(&mut header).await?;
        let (status, len) = decode_reply_header(&header)?;
        let mut payload = vec![0u8; len as usize];
        self.link.read_exact(&mut payload).await?;
        Ok(Reply { status, payload })
    }

    /// `start-download`: returns the transfer metadata on success.
    pub async fn start_download(&mut self, path: &str) -> Result<StartFrame, ResponderError> {
        let reply = self.call(Command::StartDownload, path.as_bytes()).await?;
        if !reply.is_success() {
            return Err(ResponderError::Remote(reply.status));
        }
        Ok(StartFrame::decode_body(&reply.payload)?)
    }

    /// `request-packet`: `Some(bytes)` for a served packet, `None` once the
    /// download is exhausted.
    pub async fn request_packet(&mut self) -> Result<Option<Vec<u8>>, ResponderError> {
        let reply = self.call(Command::RequestPacket, &[]).await?;
        match reply.status {
            Status::Success => Ok(Some(reply.payload)),
            Status::DownloadOver => Ok(None),
            status => Err(ResponderError::Remote(status)),
        }
    }

    /// `start-upload`: announces the whole-file digest of the coming upload.
    pub async fn start_upload(&mut self, expected: &Digest) -> Result<(), ResponderError> {
        expect_success(self.call(Command::StartUpload, expected.as_bytes()).await?)
    }

    /// `send-packet`: hands one payload chunk to the responder.
    pub async fn send_packet(&mut self, data: &[u8]) -> Result<(), ResponderError> {
        expect_success(self.call(Command::SendPacket, data).await?)
    }

    /// `finalize-upload`: asks the responder to verify and place the file.
    pub async fn finalize_upload(&mut self, destination: &str) -> Result<(), ResponderError> {
        expect_success(
            self.call(Command::FinalizeUpload, destination.as_bytes())
                .await?,
        )
    }

    /// `cancel-download`: drops the responder's download session.
    pub async fn cancel_download(&mut self) -> Result<(), ResponderError> {
        expect_success(self.call(Command::CancelDownload, &[]).await?)
    }

    /// `cancel-upload`: drops the responder's upload session and its data.
    pub async fn cancel_upload(&mut self) -> Result<(), ResponderError> {
        expect_success(self.call(Command::CancelUpload, &[]).await?)
    }

    /// Drives a whole download: start, drain packets in order, then verify
    /// the byte count and whole-file digest from the start frame.
    pub async fn fetch(&mut self, path: &str) -> Result<Vec<u8>, ResponderError> {
        let start = self.start_download(path).await?;
        let mut data = Vec::with_capacity(start.file_len as usize);
        while let Some(packet) = self.request_packet().await? {
            data.extend_from_slice(&packet);
        }

        if data.len() as u64 != start.file_len {
            return Err(ResponderError::ShortDownload {
                expected: start.file_len,
                got: data.len() as u64,
            });
        }
        if !checksum::digest_bytes(&data).matches(&start.sha256) {
            return Err(ResponderError::DigestMismatch);
        }
        Ok(data)
    }

    /// Drives a whole upload: start with the data's digest, send packets at
    /// the size ceiling, finalize into `destination`.
    pub async fn push(&mut self, data: &[u8], destination: &str) -> Result<(), ResponderError> {
        self.start_upload(&checksum::digest_bytes(data)).await?;
        for chunk in data.chunks(PACKET_SIZE) {
            self.send_packet(chunk).await?;
        }
        self.finalize_upload(destination).await
    }
}

fn expect_success(reply: Reply) -> Result<(), ResponderError> {
    if reply.is_success() {
        Ok(())
    } else {
        Err(ResponderError::Remote(reply.status))
    }
}
