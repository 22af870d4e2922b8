//! Push-mode receiver: per-packet CRC gate, then whole-file verification.

use sha2::{Digest as _, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use linehaul_protocol::{
    Control, Digest, FrameError, PACKET_HEADER_LEN, PacketHeader, START_FRAME_LEN, StartFrame,
    TAG_PACKET, crc32,
};

use crate::LinkError;

/// What a completed receive looked like on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveReport {
    pub file_len: u64,
    pub packets: u64,
    /// Packets that failed the CRC gate and were asked for again.
    pub retransmits: u64,
    /// The verified whole-file digest.
    pub sha256: Digest,
}

/// Receives one push transfer from the link, writing verified packet payloads
/// to `out` in order.
///
/// Every packet is CRC-gated before a single byte reaches `out`: a mismatch
/// answers `Again` without advancing, so the sender rewrites the same packet.
/// After the declared packet count the received byte total and the whole-file
/// SHA-256 are checked against the start frame; `out` is flushed before
/// either check so a caller can inspect the bytes behind a verification
/// failure.
pub async fn receive<L, W>(link: &mut L, out: &mut W) -> Result<ReceiveReport, LinkError>
where
    L: AsyncRead + AsyncWrite + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frame = [0u8; START_FRAME_LEN];
    link.read_exact(&mut frame).await?;
    let start = StartFrame::decode(&frame)?;
    info!(
        file_len = start.file_len,
        packets = start.packet_count,
        "start frame received"
    );

    let mut hasher = Sha256::new();
    let mut received = 0u64;
    let mut retransmits = 0u64;
    let mut index = 0u64;
    while index < start.packet_count {
        let mut tag = [0u8; 1];
        link.read_exact(&mut tag).await?;
        if tag[0] != TAG_PACKET {
            return Err(FrameError::BadTag(tag[0]).into());
        }

        let mut header = [0u8; PACKET_HEADER_LEN];
        link.read_exact(&mut header).await?;
        let header = PacketHeader::decode(&header)?;
        let mut data = vec![0u8; header.len as usize];
        link.read_exact(&mut data).await?;

        if crc32(&data) != header.crc32 {
            warn!(packet = index, "packet failed CRC, requesting retransmit");
            retransmits += 1;
            link.write_all(&[Control::Again.as_byte()]).await?;
            link.flush().await?;
            continue;
        }

        hasher.update(&data);
        received += data.len() as u64;
        out.write_all(&data).await?;
        link.write_all(&[Control::Next.as_byte()]).await?;
        link.flush().await?;
        index += 1;
    }
    out.flush().await?;

    if received != start.file_len {
        return Err(LinkError::LengthMismatch {
            expected: start.file_len,
            got: received,
        });
    }
    let sha256 = Digest::new(hasher.finalize().into());
    if !sha256.matches(&start.sha256) {
        return Err(LinkError::DigestMismatch);
    }

    info!(bytes = received, retransmits, "receive complete");
    Ok(ReceiveReport {
        file_len: received,
        packets: start.packet_count,
        retransmits,
        sha256,
    })
}
