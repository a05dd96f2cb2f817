//! Create/update/delete for user records, including the file-slot lifecycle.
//!
//! The ordering rules live here: validate everything, write new blobs, write
//! the row, and only then delete superseded blobs. A failure before the row
//! write rolls back the blobs staged in that request; a failure after it can
//! at worst leak an unreferenced file, never leave the row pointing at a
//! missing one.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::warn;

use crate::auth::password::{HashError, PasswordHasher};
use crate::database::models::{Role, UserRow};
use crate::database::users::{self, UserWrite};
use crate::storage::blobs::{BlobStore, StorageError};
use crate::storage::intake::{self, IntakeError, IntakeLimits, UploadBundle};
use crate::storage::slots::{self, Slot, SlotToken};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),
    #[error("Email is already in use")]
    EmailTaken,
    #[error("User not found")]
    NotFound,
    #[error("File not found")]
    FileMissing,
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Text fields of a create/update request, as parsed from the multipart
/// form. `None` means the field was not sent; on update that keeps the
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
}

/// A resolved download target: the absolute file path plus the name the
/// client should save it as.
#[derive(Debug)]
pub struct Download {
    pub path: PathBuf,
    pub file_name: String,
}

pub struct UserService {
    pool: SqlitePool,
    blobs: BlobStore,
    hasher: Arc<dyn PasswordHasher>,
    limits: IntakeLimits,
    // Serializes concurrent reconciliations of the same record so two
    // simultaneous updates cannot delete each other's current blobs. The map
    // only ever holds a handful of entries at admin scale, so stale ids are
    // not reclaimed.
    locks: std::sync::Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserService {
    pub fn new(
        pool: SqlitePool,
        blobs: BlobStore,
        hasher: Arc<dyn PasswordHasher>,
        limits: IntakeLimits,
    ) -> Self {
        Self {
            pool,
            blobs,
            hasher,
            limits,
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub async fn create(
        &self,
        input: UserInput,
        uploads: UploadBundle,
    ) -> Result<UserRow, UserError> {
        let name = required(input.name, "Name")?;
        let email = required(input.email, "Email")?;
        let password = required(input.password, "Password")?;
        validate_email(&email)?;
        validate_password(&password)?;

        if users::email_in_use(&self.pool, &email, None).await? {
            return Err(UserError::EmailTaken);
        }

        // All attachments are checked before any blob is written.
        intake::validate(&uploads, self.limits)?;

        let mut write = UserWrite {
            name,
            email,
            password: self.hasher.hash(&password)?,
            phone: input.phone,
            address: input.address,
            role: input.role.unwrap_or_default().to_string(),
            ..Default::default()
        };

        let mut staged: Vec<String> = Vec::new();
        let result = self.stage_uploads(&uploads, &mut write, &mut staged).await;
        if let Err(e) = result {
            self.discard(&staged).await;
            return Err(e);
        }

        let id = match users::insert(&self.pool, &write).await {
            Ok(id) => id,
            Err(e) => {
                self.discard(&staged).await;
                return Err(e.into());
            }
        };

        self.fetch(id).await
    }

    pub async fn update(
        &self,
        id: i64,
        input: UserInput,
        uploads: UploadBundle,
    ) -> Result<UserRow, UserError> {
        let _guard = self.record_lock(id);
        let _held = _guard.lock().await;

        let existing = users::find_active(&self.pool, id)
            .await?
            .ok_or(UserError::NotFound)?;

        let email = input.email.unwrap_or_else(|| existing.email.clone());
        validate_email(&email)?;
        if email != existing.email && users::email_in_use(&self.pool, &email, Some(id)).await? {
            return Err(UserError::EmailTaken);
        }

        let password = match input.password {
            Some(plain) => {
                validate_password(&plain)?;
                self.hasher.hash(&plain)?
            }
            None => existing.password.clone(),
        };

        intake::validate(&uploads, self.limits)?;

        // Start from the stored row; touched slots are overwritten below and
        // everything else is carried through the full-row update unchanged.
        let mut write = UserWrite {
            name: input.name.unwrap_or_else(|| existing.name.clone()),
            email,
            password,
            phone: input.phone.or_else(|| existing.phone.clone()),
            address: input.address.or_else(|| existing.address.clone()),
            role: input
                .role
                .map(|r| r.to_string())
                .unwrap_or_else(|| existing.role.clone()),
            profile_image: existing.profile_image.clone(),
            doc1: existing.doc1.clone(),
            doc1_original_name: existing.doc1_original_name.clone(),
            doc2: existing.doc2.clone(),
            doc2_original_name: existing.doc2_original_name.clone(),
            doc3: existing.doc3.clone(),
            doc3_original_names: existing.doc3_original_names.clone(),
            doc4: existing.doc4.clone(),
            doc4_original_names: existing.doc4_original_names.clone(),
        };

        let mut staged: Vec<String> = Vec::new();
        if let Err(e) = self.stage_uploads(&uploads, &mut write, &mut staged).await {
            self.discard(&staged).await;
            return Err(e);
        }

        // A slot with new uploads supersedes its whole stored collection.
        let mut superseded: Vec<String> = Vec::new();
        for slot in Slot::ALL {
            if uploads.touched(slot) {
                superseded.extend(stored_paths(&existing, slot));
            }
        }

        if let Err(e) = users::update(&self.pool, id, &write).await {
            self.discard(&staged).await;
            return Err(e.into());
        }

        // Post-commit cleanup. A failure here leaks an unreferenced blob,
        // which is the accepted failure direction; it never dangles the row.
        for path in superseded {
            if let Err(e) = self.blobs.delete(&path).await {
                warn!(user_id = id, path = %path, error = %e, "failed to delete superseded blob");
            }
        }

        self.fetch(id).await
    }

    /// Soft delete: the row is marked inactive and its blobs stay on disk.
    pub async fn soft_delete(&self, id: i64) -> Result<(), UserError> {
        if users::soft_delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(UserError::NotFound)
        }
    }

    /// Resolves a download selector to a concrete stored file. A row that
    /// references a blob missing from disk is reported distinctly from an
    /// unknown user and logged as an integrity anomaly.
    pub async fn resolve_download(&self, id: i64, token: &str) -> Result<Download, UserError> {
        let token = SlotToken::parse(token)
            .ok_or_else(|| UserError::Validation(format!("Unknown download selector '{token}'")))?;

        let row = users::find_active(&self.pool, id)
            .await?
            .ok_or(UserError::NotFound)?;

        let (relative, file_name) = match token {
            SlotToken::Single(slot) => {
                let (path, name) = match slot {
                    Slot::ProfileImage => (row.profile_image.clone(), None),
                    Slot::Doc1 => (row.doc1.clone(), row.doc1_original_name.clone()),
                    Slot::Doc2 => (row.doc2.clone(), row.doc2_original_name.clone()),
                    _ => unreachable!("multi-file slots always carry an index"),
                };
                let path = path.ok_or(UserError::FileMissing)?;
                let name = name.unwrap_or_else(|| fallback_name(slot.field_name(), &path));
                (path, name)
            }
            SlotToken::Indexed(slot, index) => {
                let (paths, names) = match slot {
                    Slot::Doc3 => slots::decode_multi(
                        row.doc3.as_deref(),
                        row.doc3_original_names.as_deref(),
                        row.id,
                        slot,
                    ),
                    Slot::Doc4 => slots::decode_multi(
                        row.doc4.as_deref(),
                        row.doc4_original_names.as_deref(),
                        row.id,
                        slot,
                    ),
                    _ => unreachable!("only doc3/doc4 parse as indexed"),
                };
                let path = paths.get(index).cloned().ok_or(UserError::FileMissing)?;
                let name = names
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| fallback_name(&format!("{}-{index}", slot.field_name()), &path));
                (path, name)
            }
        };

        let path = match self.blobs.resolve(&relative).await {
            Ok(path) => path,
            Err(StorageError::NotFound(_)) => {
                warn!(user_id = id, path = %relative, "row references a blob missing from storage");
                return Err(UserError::FileMissing);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Download { path, file_name })
    }

    /// Writes every attached file and records the new column values in
    /// `write`. Paths already written are appended to `staged` so the caller
    /// can roll them back if a later step fails.
    async fn stage_uploads(
        &self,
        uploads: &UploadBundle,
        write: &mut UserWrite,
        staged: &mut Vec<String>,
    ) -> Result<(), UserError> {
        for slot in Slot::ALL {
            if !uploads.touched(slot) {
                continue;
            }
            let mut files: Vec<(String, String)> = Vec::new();
            for file in uploads.get(slot) {
                let path = self
                    .blobs
                    .store(slot.area(), slot.field_name(), &file.original_name, &file.bytes)
                    .await?;
                staged.push(path.clone());
                files.push((path, file.original_name.clone()));
            }
            apply_slot(write, slot, &files);
        }
        Ok(())
    }

    /// Best-effort removal of blobs staged by a failed request.
    async fn discard(&self, staged: &[String]) {
        for path in staged {
            if let Err(e) = self.blobs.delete(path).await {
                warn!(path = %path, error = %e, "failed to roll back staged blob");
            }
        }
    }

    async fn fetch(&self, id: i64) -> Result<UserRow, UserError> {
        users::find_active(&self.pool, id)
            .await?
            .ok_or(UserError::NotFound)
    }

    fn record_lock(&self, id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id).or_default().clone()
    }
}

fn apply_slot(write: &mut UserWrite, slot: Slot, files: &[(String, String)]) {
    match slot {
        Slot::ProfileImage => {
            write.profile_image = files.first().map(|(path, _)| path.clone());
        }
        Slot::Doc1 => {
            write.doc1 = files.first().map(|(path, _)| path.clone());
            write.doc1_original_name = files.first().map(|(_, name)| name.clone());
        }
        Slot::Doc2 => {
            write.doc2 = files.first().map(|(path, _)| path.clone());
            write.doc2_original_name = files.first().map(|(_, name)| name.clone());
        }
        Slot::Doc3 => {
            let (paths, names) = slots::encode_multi(files);
            write.doc3 = paths;
            write.doc3_original_names = names;
        }
        Slot::Doc4 => {
            let (paths, names) = slots::encode_multi(files);
            write.doc4 = paths;
            write.doc4_original_names = names;
        }
    }
}

/// Every stored path a slot currently references.
fn stored_paths(row: &UserRow, slot: Slot) -> Vec<String> {
    match slot {
        Slot::ProfileImage => row.profile_image.clone().into_iter().collect(),
        Slot::Doc1 => row.doc1.clone().into_iter().collect(),
        Slot::Doc2 => row.doc2.clone().into_iter().collect(),
        Slot::Doc3 => {
            slots::decode_multi(row.doc3.as_deref(), row.doc3_original_names.as_deref(), row.id, slot).0
        }
        Slot::Doc4 => {
            slots::decode_multi(row.doc4.as_deref(), row.doc4_original_names.as_deref(), row.id, slot).0
        }
    }
}

/// `profileImage` has no stored original name; derive one from the stored
/// path's extension, e.g. `profileImage.png`.
fn fallback_name(base: &str, stored_path: &str) -> String {
    match std::path::Path::new(stored_path).extension() {
        Some(ext) => format!("{}.{}", base, ext.to_string_lossy()),
        None => base.to_string(),
    }
}

fn required(value: Option<String>, label: &str) -> Result<String, UserError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(UserError::Validation(format!("{label} is required"))),
    }
}

fn validate_email(email: &str) -> Result<(), UserError> {
    if email.contains('@') && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(UserError::Validation("Invalid email address".to_string()))
    }
}

fn validate_password(password: &str) -> Result<(), UserError> {
    if password.len() >= 6 {
        Ok(())
    } else {
        Err(UserError::Validation(
            "Password must be at least 6 characters".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::DatabaseManager;
    use crate::storage::intake::IncomingFile;
    use axum::body::Bytes;

    /// Reversible stand-in so tests do not pay the bcrypt cost.
    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, plain: &str) -> Result<String, HashError> {
            Ok(format!("hashed:{plain}"))
        }

        fn verify(&self, plain: &str, hashed: &str) -> Result<bool, HashError> {
            Ok(hashed == format!("hashed:{plain}"))
        }
    }

    const LIMITS: IntakeLimits = IntakeLimits {
        max_file_size_bytes: 1024,
        max_files_per_slot: 10,
    };

    async fn scratch_service() -> (tempfile::TempDir, UserService) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let pool = DatabaseManager::connect_at(db_path.to_str().unwrap(), 5, 5)
            .await
            .unwrap();
        DatabaseManager::init_schema(&pool).await.unwrap();
        let blobs = BlobStore::open(dir.path().join("uploads")).await.unwrap();
        let service = UserService::new(pool, blobs, Arc::new(PlainHasher), LIMITS);
        (dir, service)
    }

    fn input(email: &str) -> UserInput {
        UserInput {
            name: Some("Test User".into()),
            email: Some(email.into()),
            password: Some("secret123".into()),
            ..Default::default()
        }
    }

    fn pdf(name: &str) -> IncomingFile {
        IncomingFile {
            original_name: name.into(),
            content_type: "application/pdf".into(),
            bytes: Bytes::from_static(b"%PDF-1.4 test"),
        }
    }

    fn blob_count(root: &std::path::Path) -> usize {
        fn walk(dir: &std::path::Path, count: &mut usize) {
            for entry in std::fs::read_dir(dir).into_iter().flatten().flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, count);
                } else {
                    *count += 1;
                }
            }
        }
        let mut count = 0;
        walk(root, &mut count);
        count
    }

    #[tokio::test]
    async fn test_create_stores_files_and_encodes_slots() {
        let (_dir, service) = scratch_service().await;

        let mut uploads = UploadBundle::default();
        uploads.push(Slot::Doc1, pdf("contract.pdf"));
        uploads.push(Slot::Doc3, pdf("a.pdf"));
        uploads.push(Slot::Doc3, pdf("b.pdf"));

        let row = service.create(input("a@x.com"), uploads).await.unwrap();

        assert_eq!(row.doc1_original_name.as_deref(), Some("contract.pdf"));
        assert!(row.doc1.as_deref().unwrap().starts_with("documents/doc1-"));
        let (paths, names) =
            slots::decode_multi(row.doc3.as_deref(), row.doc3_original_names.as_deref(), row.id, Slot::Doc3);
        assert_eq!(paths.len(), 2);
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
        assert!(service.blobs().resolve(&paths[0]).await.is_ok());

        // password is stored hashed, never verbatim
        assert_eq!(row.password, "hashed:secret123");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let (_dir, service) = scratch_service().await;
        service.create(input("dup@x.com"), UploadBundle::default()).await.unwrap();
        let err = service
            .create(input("dup@x.com"), UploadBundle::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));
    }

    #[tokio::test]
    async fn test_create_requires_name_email_password() {
        let (_dir, service) = scratch_service().await;
        for broken in [
            UserInput { name: None, ..input("v@x.com") },
            UserInput { email: None, ..input("v@x.com") },
            UserInput { password: None, ..input("v@x.com") },
            UserInput { password: Some("short".into()), ..input("v@x.com") },
            UserInput { email: Some("not-an-email".into()), ..input("v@x.com") },
        ] {
            let err = service.create(broken, UploadBundle::default()).await.unwrap_err();
            assert!(matches!(err, UserError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_no_blobs_and_no_row() {
        let (dir, service) = scratch_service().await;

        let mut uploads = UploadBundle::default();
        uploads.push(Slot::Doc1, pdf("fine.pdf"));
        uploads.push(
            Slot::Doc2,
            IncomingFile {
                original_name: "notes.txt".into(),
                content_type: "text/plain".into(),
                bytes: Bytes::from_static(b"hi"),
            },
        );

        let err = service.create(input("rej@x.com"), uploads).await.unwrap_err();
        assert!(matches!(err, UserError::Intake(_)));
        assert_eq!(blob_count(&dir.path().join("uploads")), 0);

        let pool_err = service.fetch(1).await.unwrap_err();
        assert!(matches!(pool_err, UserError::NotFound));
    }

    #[tokio::test]
    async fn test_update_replaces_only_touched_slots() {
        let (_dir, service) = scratch_service().await;

        let mut uploads = UploadBundle::default();
        uploads.push(Slot::Doc1, pdf("old.pdf"));
        uploads.push(Slot::Doc2, pdf("keep.pdf"));
        let created = service.create(input("ind@x.com"), uploads).await.unwrap();
        let old_doc1 = created.doc1.clone().unwrap();

        let mut replacement = UploadBundle::default();
        replacement.push(Slot::Doc1, pdf("new.pdf"));
        let updated = service
            .update(created.id, UserInput::default(), replacement)
            .await
            .unwrap();

        assert_eq!(updated.doc1_original_name.as_deref(), Some("new.pdf"));
        assert_ne!(updated.doc1, created.doc1);
        // doc2 untouched, byte-for-byte the same reference
        assert_eq!(updated.doc2, created.doc2);
        assert_eq!(updated.doc2_original_name, created.doc2_original_name);
        // profile fields carried through
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.password, created.password);

        // the superseded blob is gone, the kept one still resolves
        assert!(matches!(
            service.blobs().resolve(&old_doc1).await.unwrap_err(),
            StorageError::NotFound(_)
        ));
        assert!(service.blobs().resolve(updated.doc2.as_deref().unwrap()).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_swaps_multi_slot_as_a_whole() {
        let (_dir, service) = scratch_service().await;

        let mut uploads = UploadBundle::default();
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            uploads.push(Slot::Doc3, pdf(name));
        }
        let created = service.create(input("multi@x.com"), uploads).await.unwrap();
        let (old_paths, _) = slots::decode_multi(
            created.doc3.as_deref(),
            created.doc3_original_names.as_deref(),
            created.id,
            Slot::Doc3,
        );
        assert_eq!(old_paths.len(), 3);

        let mut replacement = UploadBundle::default();
        replacement.push(Slot::Doc3, pdf("x.pdf"));
        replacement.push(Slot::Doc3, pdf("y.pdf"));
        let updated = service
            .update(created.id, UserInput::default(), replacement)
            .await
            .unwrap();

        let (new_paths, new_names) = slots::decode_multi(
            updated.doc3.as_deref(),
            updated.doc3_original_names.as_deref(),
            updated.id,
            Slot::Doc3,
        );
        assert_eq!(new_names, vec!["x.pdf", "y.pdf"]);
        for old in &old_paths {
            assert!(service.blobs().resolve(old).await.is_err(), "{old} should be deleted");
        }
        for new in &new_paths {
            assert!(service.blobs().resolve(new).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_update_without_password_keeps_stored_hash() {
        let (_dir, service) = scratch_service().await;
        let created = service.create(input("pw@x.com"), UploadBundle::default()).await.unwrap();

        let updated = service
            .update(
                created.id,
                UserInput { name: Some("Renamed".into()), ..Default::default() },
                UploadBundle::default(),
            )
            .await
            .unwrap();
        assert_eq!(updated.password, created.password);
        assert_eq!(updated.name, "Renamed");

        let rehashed = service
            .update(
                created.id,
                UserInput { password: Some("different1".into()), ..Default::default() },
                UploadBundle::default(),
            )
            .await
            .unwrap();
        assert_eq!(rehashed.password, "hashed:different1");
    }

    #[tokio::test]
    async fn test_soft_delete_hides_record_but_keeps_blobs() {
        let (_dir, service) = scratch_service().await;
        let mut uploads = UploadBundle::default();
        uploads.push(Slot::Doc1, pdf("kept.pdf"));
        let created = service.create(input("gone@x.com"), uploads).await.unwrap();
        let path = created.doc1.clone().unwrap();

        service.soft_delete(created.id).await.unwrap();
        assert!(matches!(
            service.fetch(created.id).await.unwrap_err(),
            UserError::NotFound
        ));
        // deleting twice reports not found
        assert!(matches!(
            service.soft_delete(created.id).await.unwrap_err(),
            UserError::NotFound
        ));
        // no blob purge on soft delete
        assert!(service.blobs().resolve(&path).await.is_ok());

        // the freed email can be reused by a new record
        service.create(input("gone@x.com"), UploadBundle::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_download_resolution_by_slot_token() {
        let (_dir, service) = scratch_service().await;
        let mut uploads = UploadBundle::default();
        uploads.push(Slot::Doc3, pdf("x.pdf"));
        uploads.push(Slot::Doc3, pdf("y.pdf"));
        uploads.push(
            Slot::ProfileImage,
            IncomingFile {
                original_name: "me.png".into(),
                content_type: "image/png".into(),
                bytes: Bytes::from_static(b"\x89PNG"),
            },
        );
        let created = service.create(input("dl@x.com"), uploads).await.unwrap();

        let second = service.resolve_download(created.id, "doc3-1").await.unwrap();
        assert_eq!(second.file_name, "y.pdf");

        // profile images have no stored original name; one is derived
        let avatar = service.resolve_download(created.id, "profileImage").await.unwrap();
        assert_eq!(avatar.file_name, "profileImage.png");

        let oob = service.resolve_download(created.id, "doc3-5").await.unwrap_err();
        assert!(matches!(oob, UserError::FileMissing));

        let empty = service.resolve_download(created.id, "doc1").await.unwrap_err();
        assert!(matches!(empty, UserError::FileMissing));

        let bad = service.resolve_download(created.id, "doc9").await.unwrap_err();
        assert!(matches!(bad, UserError::Validation(_)));

        let missing_user = service.resolve_download(9999, "doc3-0").await.unwrap_err();
        assert!(matches!(missing_user, UserError::NotFound));
    }

    #[tokio::test]
    async fn test_download_of_vanished_blob_is_file_missing() {
        let (_dir, service) = scratch_service().await;
        let mut uploads = UploadBundle::default();
        uploads.push(Slot::Doc1, pdf("gone.pdf"));
        let created = service.create(input("anomaly@x.com"), uploads).await.unwrap();

        // Simulate an out-of-band deletion under the row's feet.
        service.blobs().delete(created.doc1.as_deref().unwrap()).await.unwrap();

        let err = service.resolve_download(created.id, "doc1").await.unwrap_err();
        assert!(matches!(err, UserError::FileMissing));
    }
}
