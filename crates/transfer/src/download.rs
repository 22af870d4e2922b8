//! Download state machine: the responder is the file source.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, info};

use linehaul_protocol::{PACKET_SIZE, StartFrame, packet_count};

use crate::TransferError;
use crate::checksum;
use crate::store::{Direction, SessionStore, TransferDescriptor};

/// Download-side transfer machine.
///
/// `Idle -> Active -> (Exhausted | Cancelled)`; every transition is guarded
/// by the session store, which allows at most one live download session.
pub struct Download<S> {
    store: S,
}

impl<S: SessionStore> Download<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Starts a download of `path`.
    ///
    /// Reads the file once to compute its length, packet count, and SHA-256,
    /// persists a fresh descriptor with the cursor at zero, and returns the
    /// metadata for forwarding as a start frame.
    pub fn start(&self, path: &str) -> Result<StartFrame, TransferError> {
        if self.store.exists(Direction::Download) {
            return Err(TransferError::AlreadyDownloading);
        }

        let (sha256, total_len) = checksum::digest_file(Path::new(path))?;
        let frame = StartFrame {
            file_len: total_len,
            packet_count: packet_count(total_len),
            sha256,
        };

        self.store.save(
            Direction::Download,
            &TransferDescriptor {
                path: path.to_string(),
                total_len,
                packet_count: frame.packet_count,
                sha256,
                cursor: 0,
            },
        )?;

        info!(path, total_len, packets = frame.packet_count, "download session started");
        Ok(frame)
    }

    /// Reads the next packet's worth of bytes and advances the cursor.
    ///
    /// The cursor is persisted only after a successful read, so a crash
    /// between read and save leaves the same packet re-servable on resume.
    pub fn next_packet(&self) -> Result<Vec<u8>, TransferError> {
        let mut descriptor = self
            .store
            .load(Direction::Download)?
            .ok_or(TransferError::NotDownloading)?;

        // Re-check the source on every call; a cached handle would go stale
        // across process restarts.
        let path = Path::new(&descriptor.path);
        if !path.exists() {
            return Err(TransferError::FileDoesntExist(descriptor.path.clone()));
        }

        if descriptor.cursor >= descriptor.total_len {
            return Err(TransferError::DownloadOver);
        }

        let want = (descriptor.total_len - descriptor.cursor).min(PACKET_SIZE as u64) as usize;
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(descriptor.cursor))?;
        let mut data = vec![0u8; want];
        file.read_exact(&mut data)?;

        descriptor.cursor += want as u64;
        self.store.save(Direction::Download, &descriptor)?;

        debug!(cursor = descriptor.cursor, total = descriptor.total_len, "packet served");
        Ok(data)
    }

    /// Drops the download session; succeeds even when none exists.
    pub fn cancel(&self) -> Result<(), TransferError> {
        self.store.clear(Direction::Download)?;
        info!("download session cleared");
        Ok(())
    }
}
