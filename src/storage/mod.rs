pub mod blobs;
pub mod intake;
pub mod slots;

pub use blobs::{Area, BlobStore, StorageError};
pub use intake::{IncomingFile, IntakeError, IntakeLimits, UploadBundle};
pub use slots::{Slot, SlotToken};
