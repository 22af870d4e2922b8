//! Push-mode sender: start frame, then one packet per control-byte round.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use linehaul_protocol::{Control, FrameError, PACKET_SIZE, StartFrame, encode_packet, packet_count};
use linehaul_transfer::checksum;

use crate::LinkError;

/// What a completed send looked like on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Packet frames written, retransmissions included.
    pub frames_sent: u64,
    /// How many of those were `Again`-triggered rewrites.
    pub retransmits: u64,
}

/// Pushes `data` over the link, starting at `start_packet`.
///
/// At packet 0 the 49-byte start frame goes out first; a nonzero
/// `start_packet` resumes an interrupted transfer whose peer already holds
/// the header and the earlier packets. After each packet frame the sender
/// blocks on one control byte: `Next` advances, `Again` rewrites the same
/// packet, anything else aborts.
pub async fn send<L>(link: &mut L, data: &[u8], start_packet: u64) -> Result<SendReport, LinkError>
where
    L: AsyncRead + AsyncWrite + Unpin,
{
    let total = packet_count(data.len() as u64);
    if start_packet > 0 && start_packet >= total {
        return Err(LinkError::BadResume {
            start: start_packet,
            total,
        });
    }

    if start_packet == 0 {
        let header = StartFrame {
            file_len: data.len() as u64,
            packet_count: total,
            sha256: checksum::digest_bytes(data),
        };
        link.write_all(&header.encode()).await?;
        link.flush().await?;
        info!(file_len = header.file_len, packets = total, "start frame sent");
    } else {
        info!(start_packet, packets = total, "resuming push transfer");
    }

    let mut report = SendReport {
        frames_sent: 0,
        retransmits: 0,
    };
    let mut index = start_packet;
    while index < total {
        let offset = (index as usize) * PACKET_SIZE;
        let end = (offset + PACKET_SIZE).min(data.len());
        link.write_all(&encode_packet(&data[offset..end])?).await?;
        link.flush().await?;
        report.frames_sent += 1;

        let mut verdict = [0u8; 1];
        link.read_exact(&mut verdict).await?;
        match Control::from_byte(verdict[0]) {
            Some(Control::Next) => index += 1,
            Some(Control::Again) => {
                debug!(packet = index, "retransmit requested");
                report.retransmits += 1;
            }
            Some(Control::End) => return Err(LinkError::PrematureEnd),
            Some(Control::Error) => return Err(LinkError::PeerError),
            None => return Err(FrameError::UnknownControl(verdict[0]).into()),
        }
    }

    info!(frames = report.frames_sent, retransmits = report.retransmits, "push complete");
    Ok(report)
}
