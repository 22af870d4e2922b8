//! Durable session records, one slot per transfer direction.
//!
//! Mutual exclusion of "one active transfer per direction" rests entirely on
//! the existence check here, so `save` must replace a record atomically with
//! respect to process crashes: the filesystem store writes to a temp file
//! and renames over the old record.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use linehaul_protocol::Digest;

use crate::TransferError;

/// Transfer direction, from the responder's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Responder is the file source.
    Download,
    /// Responder is the file sink.
    Upload,
}

impl Direction {
    fn record_name(self) -> &'static str {
        match self {
            Self::Download => "download.session",
            Self::Upload => "upload.session",
        }
    }
}

/// Persisted record of one in-progress transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferDescriptor {
    /// Source path (download) or staging path (upload).
    pub path: String,
    /// Whole-file byte count. For uploads this tracks bytes received so far.
    pub total_len: u64,
    /// `ceil(total_len / PACKET_SIZE)`.
    pub packet_count: u64,
    /// Whole-file digest: computed at start for downloads, asserted by the
    /// initiator and checked at finalize for uploads.
    pub sha256: Digest,
    /// Progress marker: bytes delivered (download) or appended (upload).
    pub cursor: u64,
}

impl TransferDescriptor {
    /// Invariant check applied on both save and load: a record whose cursor
    /// ran past the file length must never be resumed from.
    fn validate(&self) -> Result<(), TransferError> {
        if self.cursor > self.total_len {
            return Err(TransferError::CorruptRecord(format!(
                "cursor {} beyond total length {}",
                self.cursor, self.total_len
            )));
        }
        Ok(())
    }
}

/// Store for transfer descriptors, one slot per direction.
pub trait SessionStore {
    /// Whether the slot holds a record.
    fn exists(&self, direction: Direction) -> bool;

    /// Loads the slot's record; `None` when empty.
    fn load(&self, direction: Direction) -> Result<Option<TransferDescriptor>, TransferError>;

    /// Durably replaces the slot's record. Must be crash-atomic: either the
    /// new record is fully in place or the prior one is untouched.
    fn save(
        &self,
        direction: Direction,
        descriptor: &TransferDescriptor,
    ) -> Result<(), TransferError>;

    /// Empties the slot. Clearing an empty slot is not an error.
    fn clear(&self, direction: Direction) -> Result<(), TransferError>;
}

// ---------------------------------------------------------------------------
// Filesystem store
// ---------------------------------------------------------------------------

/// Filesystem-backed store: one JSON record per direction under `root`.
#[derive(Debug, Clone)]
pub struct FsSessionStore {
    root: PathBuf,
}

impl FsSessionStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, TransferError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, direction: Direction) -> PathBuf {
        self.root.join(direction.record_name())
    }
}

impl SessionStore for FsSessionStore {
    fn exists(&self, direction: Direction) -> bool {
        self.record_path(direction).exists()
    }

    fn load(&self, direction: Direction) -> Result<Option<TransferDescriptor>, TransferError> {
        let path = self.record_path(direction);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let descriptor: TransferDescriptor =
            serde_json::from_str(&data).map_err(|e| TransferError::CorruptRecord(e.to_string()))?;
        descriptor.validate()?;
        Ok(Some(descriptor))
    }

    fn save(
        &self,
        direction: Direction,
        descriptor: &TransferDescriptor,
    ) -> Result<(), TransferError> {
        descriptor.validate()?;
        let data = serde_json::to_vec(descriptor)
            .map_err(|e| TransferError::CorruptRecord(e.to_string()))?;

        // Write-to-temp then rename: the record must be durable before the
        // corresponding reply goes out, and a crash mid-write must leave the
        // prior record intact.
        let path = self.record_path(direction);
        let tmp = self.root.join(format!("{}.tmp", direction.record_name()));
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn clear(&self, direction: Direction) -> Result<(), TransferError> {
        match fs::remove_file(self.record_path(direction)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory store for tests and embedding. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slots: Arc<RwLock<HashMap<Direction, TransferDescriptor>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn exists(&self, direction: Direction) -> bool {
        self.slots.read().unwrap().contains_key(&direction)
    }

    fn load(&self, direction: Direction) -> Result<Option<TransferDescriptor>, TransferError> {
        let descriptor = self.slots.read().unwrap().get(&direction).cloned();
        if let Some(d) = &descriptor {
            d.validate()?;
        }
        Ok(descriptor)
    }

    fn save(
        &self,
        direction: Direction,
        descriptor: &TransferDescriptor,
    ) -> Result<(), TransferError> {
        descriptor.validate()?;
        self.slots
            .write()
            .unwrap()
            .insert(direction, descriptor.clone());
        Ok(())
    }

    fn clear(&self, direction: Direction) -> Result<(), TransferError> {
        self.slots.write().unwrap().remove(&direction);
        Ok(())
    }
}
