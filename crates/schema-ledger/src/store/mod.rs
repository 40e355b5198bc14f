//! Catalog persistence: exclusive file handle, load-or-create, rewrite+sync.

use std::fs::{File, OpenOptions, TryLockError};
use std::io::{Read, Seek, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::Catalog;

/// A catalog bound to its backing file.
///
/// The handle is opened read-write and exclusively locked for the lifetime
/// of this value; the lock is the mutual-exclusion guard against concurrent
/// generator invocations sharing one catalog file. There is no separate
/// lock file.
#[derive(Debug)]
pub struct CatalogFile {
    catalog: Catalog,
    file: File,
    path: PathBuf,
}

impl CatalogFile {
    /// Opens the catalog at `path`, creating a fresh one (and its file) if
    /// none exists yet.
    ///
    /// Fails fast with [`StoreError::Locked`] when another live instance
    /// holds the file; serializing generator runs is the caller's job.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Self::create(path)
        }
    }

    fn load(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| StoreError::Open {
                path: path.into(),
                source,
            })?;
        lock(&file, path)?;

        let mut contents = String::new();
        (&file)
            .read_to_string(&mut contents)
            .map_err(|source| StoreError::Read {
                path: path.into(),
                source,
            })?;

        // The handle (and its lock) is dropped on the error path here, so a
        // corrupt file does not stay locked.
        let catalog = serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
            path: path.into(),
            source,
        })?;

        debug!(path = %path.display(), "loaded catalog");
        Ok(Self {
            catalog,
            file,
            path: path.into(),
        })
    }

    fn create(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| StoreError::Open {
                path: path.into(),
                source,
            })?;
        lock(&file, path)?;

        let mut this = Self {
            catalog: Catalog::new(),
            file,
            path: path.into(),
        };

        // Written right away so the path is known to be writable and the
        // next run finds well-formed contents.
        this.write()?;
        info!(path = %path.display(), "created new catalog");
        Ok(this)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes the catalog and replaces the file contents:
    /// truncate to zero, write at offset zero, sync. A failed write can
    /// therefore not leave a silent mix of old and new bytes behind.
    pub fn write(&mut self) -> Result<(), StoreError> {
        let mut data =
            serde_json::to_vec_pretty(&self.catalog).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        data.push(b'\n');

        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        self.file.set_len(0).map_err(write_err)?;
        self.file.seek(SeekFrom::Start(0)).map_err(write_err)?;
        self.file.write_all(&data).map_err(write_err)?;
        self.file.sync_all().map_err(write_err)?;

        debug!(path = %self.path.display(), bytes = data.len(), "wrote catalog");
        Ok(())
    }

    /// Releases the exclusive handle. Dropping the value has the same
    /// effect; this form surfaces unlock errors.
    pub fn close(self) -> Result<(), StoreError> {
        self.file.unlock().map_err(|source| StoreError::Close {
            path: self.path.clone(),
            source,
        })
    }
}

fn lock(file: &File, path: &Path) -> Result<(), StoreError> {
    match file.try_lock() {
        Ok(()) => Ok(()),
        Err(TryLockError::WouldBlock) => Err(StoreError::Locked { path: path.into() }),
        Err(TryLockError::Error(source)) => Err(StoreError::Open {
            path: path.into(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Binding, BindingEntity, BindingProperty, BindingRelation, Identifier};
    use crate::reconcile::reconcile;
    use crate::uid::SequenceUidSource;

    use super::*;

    fn temp_catalog_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("schema-ledger.json")
    }

    /// A catalog with three entities and a mix of properties, indexes, and
    /// relations, built through the real reconciliation path.
    fn populated() -> Catalog {
        let mut binding = Binding {
            package: "model".to_string(),
            entities: vec![
                BindingEntity {
                    name: "Customer".to_string(),
                    properties: vec![
                        BindingProperty {
                            name: "id".to_string(),
                            type_code: 6,
                            ..Default::default()
                        },
                        BindingProperty {
                            name: "email".to_string(),
                            type_code: 9,
                            index: Some(Identifier::default()),
                            ..Default::default()
                        },
                    ],
                    relations: vec![BindingRelation {
                        name: "orders".to_string(),
                        target: "Order".to_string(),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                BindingEntity {
                    name: "Order".to_string(),
                    properties: vec![
                        BindingProperty {
                            name: "id".to_string(),
                            type_code: 6,
                            ..Default::default()
                        },
                        BindingProperty {
                            name: "customer".to_string(),
                            type_code: 11,
                            relation_target: Some("Customer".to_string()),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
                BindingEntity {
                    name: "Item".to_string(),
                    properties: vec![BindingProperty {
                        name: "id".to_string(),
                        type_code: 6,
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            ],
        };

        let mut catalog = Catalog::new();
        let mut uids = SequenceUidSource::starting_at(1000);
        reconcile(&mut binding, &mut catalog, &mut uids).unwrap();
        catalog.retired_property_uids.push(777);
        catalog
    }

    #[test]
    fn test_create_writes_initial_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_catalog_path(&dir);

        let file = CatalogFile::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert!(file.catalog().entities.is_empty());
        file.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("KEEP THIS FILE"));
        assert!(contents.contains("\"retiredEntityUids\": []"));
    }

    #[test]
    fn test_write_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_catalog_path(&dir);

        let mut written = populated();
        {
            let mut file = CatalogFile::load_or_create(&path).unwrap();
            *file.catalog_mut() = written.clone();
            file.write().unwrap();
            file.close().unwrap();
        }

        let reloaded = CatalogFile::load_or_create(&path).unwrap();

        // `package` and relation targets are deliberately not persisted.
        written.package = String::new();
        for entity in &mut written.entities {
            for relation in &mut entity.relations {
                relation.target = String::new();
            }
        }
        assert_eq!(*reloaded.catalog(), written);
        assert!(reloaded.catalog().validate().is_ok());
    }

    #[test]
    fn test_write_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_catalog_path(&dir);

        let mut file = CatalogFile::load_or_create(&path).unwrap();
        *file.catalog_mut() = populated();
        file.write().unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        file.write().unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rewrite_truncates_longer_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_catalog_path(&dir);

        let mut file = CatalogFile::load_or_create(&path).unwrap();
        *file.catalog_mut() = populated();
        file.write().unwrap();

        // Shrink the catalog; stale trailing bytes must not survive.
        file.catalog_mut().entities.truncate(1);
        file.catalog_mut().last_entity_id = file.catalog().entities[0].id.clone();
        file.write().unwrap();
        file.close().unwrap();

        let reloaded = CatalogFile::load_or_create(&path).unwrap();
        assert_eq!(reloaded.catalog().entities.len(), 1);
    }

    #[test]
    fn test_second_open_fails_while_locked() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_catalog_path(&dir);

        let held = CatalogFile::load_or_create(&path).unwrap();
        let err = CatalogFile::load_or_create(&path).unwrap_err();
        assert!(matches!(err, StoreError::Locked { .. }));

        // Closing the first instance releases the lock.
        held.close().unwrap();
        assert!(CatalogFile::load_or_create(&path).is_ok());
    }

    #[test]
    fn test_garbage_contents_fail_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_catalog_path(&dir);
        std::fs::write(&path, "{ not json").unwrap();

        let err = CatalogFile::load_or_create(&path).unwrap_err();
        match err {
            StoreError::Parse { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other:?}"),
        }

        // The failed load released its handle.
        std::fs::write(&path, "{}").unwrap();
    }

    #[test]
    fn test_missing_retired_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_catalog_path(&dir);

        // retiredPropertyUids is absent, as opposed to empty: the file was
        // written by something else or hand-edited, and must be rejected.
        std::fs::write(
            &path,
            r#"{
  "comment": [],
  "entities": [],
  "lastEntityId": "",
  "retiredEntityUids": [],
  "retiredIndexUids": []
}"#,
        )
        .unwrap();

        let err = CatalogFile::load_or_create(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_older_catalog_without_relation_fields_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_catalog_path(&dir);

        std::fs::write(
            &path,
            r#"{
  "comment": [],
  "entities": [],
  "lastEntityId": "",
  "lastIndexId": "",
  "retiredEntityUids": [],
  "retiredIndexUids": [],
  "retiredPropertyUids": []
}"#,
        )
        .unwrap();

        let file = CatalogFile::load_or_create(&path).unwrap();
        assert!(file.catalog().retired_relation_uids.is_empty());
        assert!(file.catalog().last_relation_id.is_empty());
    }
}
