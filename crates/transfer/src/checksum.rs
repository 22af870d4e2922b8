//! Checksum engines: per-packet CRC32 and whole-file SHA-256.
//!
//! The CRC decides retransmit-vs-accept for a single packet and guards
//! against link noise only. The SHA-256 digest is the end-to-end check,
//! computed once over the whole file at transfer start (download) and once
//! at finalize (upload).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest as _, Sha256};

pub use linehaul_protocol::crc32;
use linehaul_protocol::Digest;

use crate::TransferError;

/// SHA-256 of an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Digest::new(hasher.finalize().into())
}

/// SHA-256 of an entire file, streamed in 8 KiB reads.
///
/// Returns the digest together with the byte count seen, so callers that
/// need both make a single pass.
pub fn digest_file(path: &Path) -> Result<(Digest, u64), TransferError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((Digest::new(hasher.finalize().into()), total))
}
