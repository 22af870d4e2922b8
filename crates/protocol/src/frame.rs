//! Frame codecs for both wire modes.
//!
//! # Wire format
//!
//! ```text
//! START FRAME (push):   [1: tag=1][8 LE: file_len][8 LE: packet_count][32: sha256]
//! PACKET FRAME (push):  [1: tag=2][2 LE: len <= 32768][4 LE: crc32][len: data]
//! CONTROL (push):       [1: Next=3 | Again=4 | End=5 | Error=6]
//!
//! REQUEST (pull):       [1: command][2 LE: payload_len][payload]
//! REPLY (pull):         [1: status][2 LE: payload_len][payload]
//! ```
//!
//! The 48-byte start-frame body doubles as the `start-download` success
//! payload in pull mode.

use crate::command::{Command, Reply, Status};
use crate::digest::Digest;
use crate::PACKET_SIZE;

/// Push-frame tag: the 49-byte transfer header.
pub const TAG_START: u8 = 1;

/// Push-frame tag: one payload packet.
pub const TAG_PACKET: u8 = 2;

/// Total bytes in a start frame, tag included.
pub const START_FRAME_LEN: usize = 49;

/// Bytes in a packet header after the tag (length + CRC32).
pub const PACKET_HEADER_LEN: usize = 6;

/// Bytes in a pull-mode request header (command + payload length).
pub const REQUEST_HEADER_LEN: usize = 3;

/// Bytes in a pull-mode reply header (status + payload length).
pub const REPLY_HEADER_LEN: usize = 3;

/// Errors from frame encoding/decoding.
///
/// A malformed frame must be rejected before any checksum validation; the
/// CRC is only meaningful on a structurally valid packet.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame too short: need {need} bytes, got {got}")]
    TooShort { need: usize, got: usize },

    #[error("packet length {len} exceeds the 32768-byte ceiling")]
    Oversize { len: usize },

    #[error("declared packet length {declared} does not match {actual} data bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unexpected frame tag {0:#04x}")]
    BadTag(u8),

    #[error("unknown status byte {0}")]
    UnknownStatus(u8),

    #[error("unknown control byte {0}")]
    UnknownControl(u8),

    #[error("payload of {0} bytes does not fit a 16-bit length field")]
    PayloadTooLarge(usize),
}

/// Standard reflected CRC32 of one packet payload.
///
/// Link-error detection only; deliberate tampering is caught by the
/// whole-file digest, not by this.
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn u16_le(bytes: &[u8]) -> u16 {
    let mut buf = [0u8; 2];
    buf.copy_from_slice(&bytes[..2]);
    u16::from_le_bytes(buf)
}

fn u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

// ---------------------------------------------------------------------------
// Start frame
// ---------------------------------------------------------------------------

/// The transfer header: total file length, packet count, whole-file digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartFrame {
    pub file_len: u64,
    pub packet_count: u64,
    pub sha256: Digest,
}

impl StartFrame {
    /// Encodes the full push frame, tag included.
    pub fn encode(&self) -> [u8; START_FRAME_LEN] {
        let mut buf = [0u8; START_FRAME_LEN];
        buf[0] = TAG_START;
        buf[1..].copy_from_slice(&self.encode_body());
        buf
    }

    /// Encodes the 48-byte body (also the `start-download` success payload).
    pub fn encode_body(&self) -> [u8; START_FRAME_LEN - 1] {
        let mut buf = [0u8; START_FRAME_LEN - 1];
        buf[0..8].copy_from_slice(&self.file_len.to_le_bytes());
        buf[8..16].copy_from_slice(&self.packet_count.to_le_bytes());
        buf[16..48].copy_from_slice(self.sha256.as_bytes());
        buf
    }

    /// Decodes a full push frame, tag included.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < START_FRAME_LEN {
            return Err(FrameError::TooShort {
                need: START_FRAME_LEN,
                got: bytes.len(),
            });
        }
        if bytes[0] != TAG_START {
            return Err(FrameError::BadTag(bytes[0]));
        }
        Self::decode_body(&bytes[1..START_FRAME_LEN])
    }

    /// Decodes the 48-byte body.
    pub fn decode_body(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < START_FRAME_LEN - 1 {
            return Err(FrameError::TooShort {
                need: START_FRAME_LEN - 1,
                got: bytes.len(),
            });
        }
        let mut sha = [0u8; 32];
        sha.copy_from_slice(&bytes[16..48]);
        Ok(Self {
            file_len: u64_le(&bytes[0..8]),
            packet_count: u64_le(&bytes[8..16]),
            sha256: Digest::new(sha),
        })
    }
}

// ---------------------------------------------------------------------------
// Packet frame
// ---------------------------------------------------------------------------

/// Packet header fields recovered from the 6 bytes following the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub len: u16,
    pub crc32: u32,
}

impl PacketHeader {
    /// Decodes the 6 header bytes that follow a [`TAG_PACKET`] tag.
    ///
    /// Rejects declared lengths above the packet-size ceiling; the payload
    /// itself is read separately by the caller.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < PACKET_HEADER_LEN {
            return Err(FrameError::TooShort {
                need: PACKET_HEADER_LEN,
                got: bytes.len(),
            });
        }
        let len = u16_le(&bytes[0..2]);
        if len as usize > PACKET_SIZE {
            return Err(FrameError::Oversize { len: len as usize });
        }
        Ok(Self {
            len,
            crc32: u32_le(&bytes[2..6]),
        })
    }
}

/// Encodes a full packet frame: tag, declared length, CRC32 (computed here),
/// payload.
pub fn encode_packet(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > PACKET_SIZE {
        return Err(FrameError::Oversize { len: payload.len() });
    }
    let mut buf = Vec::with_capacity(1 + PACKET_HEADER_LEN + payload.len());
    buf.push(TAG_PACKET);
    buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    buf.extend_from_slice(&crc32(payload).to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decodes a complete packet frame (tag included).
///
/// The declared length must equal the bytes actually present; a mismatch is
/// a malformed frame, not a checksum failure. CRC validation is left to the
/// caller and is only meaningful once this returns `Ok`.
pub fn decode_packet(bytes: &[u8]) -> Result<(PacketHeader, &[u8]), FrameError> {
    if bytes.len() < 1 + PACKET_HEADER_LEN {
        return Err(FrameError::TooShort {
            need: 1 + PACKET_HEADER_LEN,
            got: bytes.len(),
        });
    }
    if bytes[0] != TAG_PACKET {
        return Err(FrameError::BadTag(bytes[0]));
    }
    let header = PacketHeader::decode(&bytes[1..])?;
    let data = &bytes[1 + PACKET_HEADER_LEN..];
    if data.len() != header.len as usize {
        return Err(FrameError::LengthMismatch {
            declared: header.len as usize,
            actual: data.len(),
        });
    }
    Ok((header, data))
}

// ---------------------------------------------------------------------------
// Pull-mode request/reply framing
// ---------------------------------------------------------------------------

/// Encodes one request frame: command byte, payload length, payload.
pub fn encode_request(command: Command, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > u16::MAX as usize {
        return Err(FrameError::PayloadTooLarge(payload.len()));
    }
    let mut buf = Vec::with_capacity(REQUEST_HEADER_LEN + payload.len());
    buf.push(command.as_byte());
    buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Splits a request header into the raw command byte and payload length.
///
/// The command byte stays raw so an unknown command can be answered with an
/// error reply instead of failing the decode.
pub fn decode_request_header(bytes: &[u8]) -> Result<(u8, u16), FrameError> {
    if bytes.len() < REQUEST_HEADER_LEN {
        return Err(FrameError::TooShort {
            need: REQUEST_HEADER_LEN,
            got: bytes.len(),
        });
    }
    Ok((bytes[0], u16_le(&bytes[1..3])))
}

/// Encodes one reply frame: status byte, payload length, payload.
pub fn encode_reply(reply: &Reply) -> Result<Vec<u8>, FrameError> {
    if reply.payload.len() > u16::MAX as usize {
        return Err(FrameError::PayloadTooLarge(reply.payload.len()));
    }
    let mut buf = Vec::with_capacity(REPLY_HEADER_LEN + reply.payload.len());
    buf.push(reply.status.as_byte());
    buf.extend_from_slice(&(reply.payload.len() as u16).to_le_bytes());
    buf.extend_from_slice(&reply.payload);
    Ok(buf)
}

/// Splits a reply header into its status and payload length.
pub fn decode_reply_header(bytes: &[u8]) -> Result<(Status, u16), FrameError> {
    if bytes.len() < REPLY_HEADER_LEN {
        return Err(FrameError::TooShort {
            need: REPLY_HEADER_LEN,
            got: bytes.len(),
        });
    }
    let status = Status::from_byte(bytes[0]).ok_or(FrameError::UnknownStatus(bytes[0]))?;
    Ok((status, u16_le(&bytes[1..3])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_digest() -> Digest {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = 0xA0 ^ i as u8;
        }
        Digest::new(bytes)
    }

    #[test]
    fn start_frame_roundtrip() {
        let frame = StartFrame {
            file_len: 100_000,
            packet_count: 4,
            sha256: sample_digest(),
        };
        let bytes = frame.encode();
        assert_eq!(bytes.len(), START_FRAME_LEN);
        assert_eq!(bytes[0], TAG_START);

        let decoded = StartFrame::decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn start_frame_layout_is_little_endian() {
        let frame = StartFrame {
            file_len: 0x0102_0304_0506_0708,
            packet_count: 1,
            sha256: sample_digest(),
        };
        let bytes = frame.encode();
        assert_eq!(&bytes[1..9], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[9..17], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[17..49], frame.sha256.as_bytes());
    }

    #[test]
    fn start_frame_body_doubles_as_reply_payload() {
        let frame = StartFrame {
            file_len: 42,
            packet_count: 1,
            sha256: sample_digest(),
        };
        let body = frame.encode_body();
        assert_eq!(body.len(), 48);
        assert_eq!(StartFrame::decode_body(&body).unwrap(), frame);
    }

    #[test]
    fn start_frame_rejects_short_input() {
        let err = StartFrame::decode(&[TAG_START; 10]).unwrap_err();
        assert!(matches!(err, FrameError::TooShort { need: 49, got: 10 }));
    }

    #[test]
    fn start_frame_rejects_wrong_tag() {
        let mut bytes = StartFrame {
            file_len: 1,
            packet_count: 1,
            sha256: sample_digest(),
        }
        .encode();
        bytes[0] = TAG_PACKET;
        assert!(matches!(
            StartFrame::decode(&bytes),
            Err(FrameError::BadTag(2))
        ));
    }

    #[test]
    fn packet_roundtrip_recovers_length_and_crc() {
        let payload = b"The quick brown fox jumps over the lazy dog";
        let frame = encode_packet(payload).unwrap();
        assert_eq!(frame.len(), 1 + PACKET_HEADER_LEN + payload.len());
        assert_eq!(frame[0], TAG_PACKET);

        let (header, data) = decode_packet(&frame).unwrap();
        assert_eq!(header.len as usize, payload.len());
        assert_eq!(header.crc32, crc32(payload));
        assert_eq!(data, payload);
    }

    #[test]
    fn packet_empty_payload() {
        let frame = encode_packet(&[]).unwrap();
        let (header, data) = decode_packet(&frame).unwrap();
        assert_eq!(header.len, 0);
        assert!(data.is_empty());
    }

    #[test]
    fn packet_at_ceiling_accepted() {
        let payload = vec![0x5A; PACKET_SIZE];
        let frame = encode_packet(&payload).unwrap();
        let (header, data) = decode_packet(&frame).unwrap();
        assert_eq!(header.len as usize, PACKET_SIZE);
        assert_eq!(data.len(), PACKET_SIZE);
    }

    #[test]
    fn packet_over_ceiling_rejected() {
        let payload = vec![0u8; PACKET_SIZE + 1];
        assert!(matches!(
            encode_packet(&payload),
            Err(FrameError::Oversize { .. })
        ));
    }

    #[test]
    fn packet_header_rejects_oversize_declared_length() {
        let mut header = [0u8; PACKET_HEADER_LEN];
        header[0..2].copy_from_slice(&((PACKET_SIZE as u16) + 1).to_le_bytes());
        assert!(matches!(
            PacketHeader::decode(&header),
            Err(FrameError::Oversize { .. })
        ));
    }

    #[test]
    fn packet_declared_length_must_match_data() {
        let mut frame = encode_packet(b"abcdef").unwrap();
        // Truncate one data byte: declared 6, present 5.
        frame.pop();
        assert!(matches!(
            decode_packet(&frame),
            Err(FrameError::LengthMismatch {
                declared: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn request_roundtrip() {
        let frame = encode_request(Command::StartDownload, b"/data/image.bin").unwrap();
        let (cmd, len) = decode_request_header(&frame).unwrap();
        assert_eq!(cmd, Command::StartDownload.as_byte());
        assert_eq!(len as usize, frame.len() - REQUEST_HEADER_LEN);
        assert_eq!(&frame[REQUEST_HEADER_LEN..], b"/data/image.bin");
    }

    #[test]
    fn request_header_keeps_unknown_command_raw() {
        let (cmd, len) = decode_request_header(&[0xFF, 0x02, 0x00]).unwrap();
        assert_eq!(cmd, 0xFF);
        assert_eq!(len, 2);
    }

    #[test]
    fn reply_roundtrip() {
        let reply = Reply::ok(vec![9, 8, 7]);
        let frame = encode_reply(&reply).unwrap();
        let (status, len) = decode_reply_header(&frame).unwrap();
        assert_eq!(status, Status::Success);
        assert_eq!(len, 3);
        assert_eq!(&frame[REPLY_HEADER_LEN..], &[9, 8, 7]);
    }

    #[test]
    fn reply_header_rejects_unknown_status() {
        assert!(matches!(
            decode_reply_header(&[42, 0, 0]),
            Err(FrameError::UnknownStatus(42))
        ));
    }

    #[test]
    fn crc32_known_value() {
        // Standard reflected CRC32 test vector.
        assert_eq!(crc32(b"hello"), 0x3610_A686);
    }
}
