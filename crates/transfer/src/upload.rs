//! Upload state machine: the responder is the file sink.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use linehaul_protocol::{Digest, packet_count};

use crate::TransferError;
use crate::checksum;
use crate::store::{Direction, SessionStore, TransferDescriptor};

/// Upload-side transfer machine.
///
/// `Idle -> Receiving -> (Finalized | Cancelled)`. Received bytes accumulate
/// in an append-only staging file and move to their destination in a single
/// rename at finalize.
pub struct Upload<S> {
    store: S,
    staging: PathBuf,
}

impl<S: SessionStore> Upload<S> {
    /// `staging` is the file where received bytes accumulate until finalize.
    pub fn new(store: S, staging: impl Into<PathBuf>) -> Self {
        Self {
            store,
            staging: staging.into(),
        }
    }

    /// Opens a fresh upload session expecting a file with digest `expected`.
    pub fn start(&self, expected: Digest) -> Result<(), TransferError> {
        if self.store.exists(Direction::Upload) {
            return Err(TransferError::AlreadyUploading);
        }

        // Fresh, empty receiving store.
        File::create(&self.staging)?;

        self.store.save(
            Direction::Upload,
            &TransferDescriptor {
                path: self.staging.to_string_lossy().into_owned(),
                total_len: 0,
                packet_count: 0,
                sha256: expected,
                cursor: 0,
            },
        )?;

        info!(staging = %self.staging.display(), expected = %expected, "upload session started");
        Ok(())
    }

    /// Appends one packet's payload to the receiving store.
    ///
    /// Appends only, never seeks: packet ordering is the link layer's
    /// contract, and an out-of-order packet must surface as a corrupt upload
    /// at finalize rather than be silently repositioned here.
    pub fn accept_packet(&self, data: &[u8]) -> Result<(), TransferError> {
        let mut descriptor = self
            .store
            .load(Direction::Upload)?
            .ok_or(TransferError::NotUploading)?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.staging)?;
        file.write_all(data)?;
        // Staging bytes must be on disk before the cursor says they are.
        file.sync_all()?;

        descriptor.cursor += data.len() as u64;
        descriptor.total_len = descriptor.cursor;
        descriptor.packet_count = packet_count(descriptor.total_len);
        self.store.save(Direction::Upload, &descriptor)?;

        debug!(received = descriptor.cursor, "packet accepted");
        Ok(())
    }

    /// Verifies the received bytes against the expected digest, then moves
    /// the staging file to `destination`.
    ///
    /// On a digest mismatch the session and staging file are retained so the
    /// caller may retry or cancel explicitly.
    pub fn finalize(&self, destination: &str) -> Result<(), TransferError> {
        let descriptor = self
            .store
            .load(Direction::Upload)?
            .ok_or(TransferError::NotUploading)?;

        let (actual, received) = checksum::digest_file(&self.staging)?;
        if !actual.matches(&descriptor.sha256) {
            warn!(expected = %descriptor.sha256, got = %actual, received, "upload digest mismatch");
            return Err(TransferError::ShasumMismatch);
        }

        fs::rename(&self.staging, destination)?;
        self.store.clear(Direction::Upload)?;

        info!(destination, bytes = received, "upload finalized");
        Ok(())
    }

    /// Discards the receiving store and the session; succeeds even when no
    /// session exists.
    pub fn cancel(&self) -> Result<(), TransferError> {
        match fs::remove_file(&self.staging) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.store.clear(Direction::Upload)?;
        info!("upload session cleared");
        Ok(())
    }
}
