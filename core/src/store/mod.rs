//! Backup storage: one snapshot slot in a well-known location.
//!
//! RULE: Only store implementations touch the backup location.
//! Commands go through the SnapshotStore trait; they never open the file
//! or the database directly.

mod file;
mod sqlite;

pub use file::FileSnapshotStore;
pub use sqlite::SqliteSnapshotStore;

use crate::error::StorageResult;

/// A single overwritable backup slot.
///
/// Presence of a snapshot is itself the signal that a game was in progress
/// when the application was last alive.
pub trait SnapshotStore {
    /// True iff a snapshot is present.
    fn exists(&self) -> bool;

    /// Raw snapshot bytes. `StorageError::Missing` if there is none.
    fn read(&self) -> StorageResult<Vec<u8>>;

    /// Replace any existing snapshot in one step.
    fn write(&self, bytes: &[u8]) -> StorageResult<()>;

    /// Remove the snapshot. Not an error if there is none.
    fn delete(&self) -> StorageResult<()>;

    /// Human-readable location for log messages.
    fn location(&self) -> String;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn read(&self) -> StorageResult<Vec<u8>> {
        (**self).read()
    }

    fn write(&self, bytes: &[u8]) -> StorageResult<()> {
        (**self).write(bytes)
    }

    fn delete(&self) -> StorageResult<()> {
        (**self).delete()
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
