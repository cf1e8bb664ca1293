//! Where completed session results live.
//!
//! Anonymous users keep results in the local JSON store. Signed-in users keep
//! them remotely, with anything recorded locally before sign-in moved over on
//! the first load. Public profiles are read-only views of someone's remote
//! results. The remote itself is supplied by the caller.

use tracing::debug;

use crate::session::result::SessionResult;
use crate::store::StorageError;
use crate::store::json_store::JsonStore;
use crate::store::schema::SCHEMA_VERSION;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpenRequest {
    Private { user_id: Option<String> },
    Public { user_id: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Local,
    Synced { user_id: String },
    PublicView { user_id: String },
}

pub fn select_storage(request: &OpenRequest) -> StorageKind {
    match request {
        OpenRequest::Private { user_id: None } => StorageKind::Local,
        OpenRequest::Private {
            user_id: Some(user_id),
        } => StorageKind::Synced {
            user_id: user_id.clone(),
        },
        OpenRequest::Public { user_id } => StorageKind::PublicView {
            user_id: user_id.clone(),
        },
    }
}

pub trait ResultStorage {
    fn load(&mut self) -> Result<Vec<SessionResult>, StorageError>;

    fn append(&mut self, results: &[SessionResult]) -> Result<(), StorageError>;

    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Opens the storage selected for `request`. `remote_for_user` is only
/// called for requests that carry a user id.
pub fn open_storage(
    request: &OpenRequest,
    local: Box<dyn ResultStorage>,
    remote_for_user: impl FnOnce(&str) -> Box<dyn ResultStorage>,
) -> Box<dyn ResultStorage> {
    match select_storage(request) {
        StorageKind::Local => local,
        StorageKind::Synced { user_id } => {
            Box::new(SyncedStorage::new(local, remote_for_user(&user_id)))
        }
        StorageKind::PublicView { user_id } => {
            Box::new(PublicStorage::new(remote_for_user(&user_id)))
        }
    }
}

pub struct LocalStorage {
    store: JsonStore,
}

impl LocalStorage {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }
}

impl ResultStorage for LocalStorage {
    fn load(&mut self) -> Result<Vec<SessionResult>, StorageError> {
        let data = self.store.load_results();
        if data.schema_version != SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: data.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(data.results)
    }

    fn append(&mut self, results: &[SessionResult]) -> Result<(), StorageError> {
        let mut data = self.store.load_results();
        if data.schema_version != SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: data.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        data.results.extend_from_slice(results);
        self.store.save_results(&data)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.store.save_results(&Default::default())
    }
}

/// Remote is authoritative; local results are moved there on first load.
pub struct SyncedStorage {
    local: Box<dyn ResultStorage>,
    remote: Box<dyn ResultStorage>,
    merged: bool,
}

impl SyncedStorage {
    pub fn new(local: Box<dyn ResultStorage>, remote: Box<dyn ResultStorage>) -> Self {
        Self {
            local,
            remote,
            merged: false,
        }
    }
}

impl ResultStorage for SyncedStorage {
    fn load(&mut self) -> Result<Vec<SessionResult>, StorageError> {
        if !self.merged {
            let pending = self.local.load()?;
            if !pending.is_empty() {
                debug!(count = pending.len(), "moving local results to remote");
                self.remote.append(&pending)?;
                // The remote holds them now; a failed clear must not merge twice.
                self.merged = true;
                self.local.clear()?;
            }
            self.merged = true;
        }
        self.remote.load()
    }

    fn append(&mut self, results: &[SessionResult]) -> Result<(), StorageError> {
        self.remote.append(results)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.remote.clear()
    }
}

/// Read-only view; writes are dropped.
pub struct PublicStorage {
    remote: Box<dyn ResultStorage>,
}

impl PublicStorage {
    pub fn new(remote: Box<dyn ResultStorage>) -> Self {
        Self { remote }
    }
}

impl ResultStorage for PublicStorage {
    fn load(&mut self) -> Result<Vec<SessionResult>, StorageError> {
        self.remote.load()
    }

    fn append(&mut self, results: &[SessionResult]) -> Result<(), StorageError> {
        debug!(count = results.len(), "ignoring append to public view");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// In-process storage, shared between clones.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    results: std::rc::Rc<std::cell::RefCell<Vec<SessionResult>>>,
}

impl MemoryStorage {
    pub fn len(&self) -> usize {
        self.results.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.borrow().is_empty()
    }
}

impl ResultStorage for MemoryStorage {
    fn load(&mut self) -> Result<Vec<SessionResult>, StorageError> {
        Ok(self.results.borrow().clone())
    }

    fn append(&mut self, results: &[SessionResult]) -> Result<(), StorageError> {
        self.results.borrow_mut().extend_from_slice(results);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.results.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::session::text_input::{Settings, Step};
    use tempfile::TempDir;

    fn result(len: u64) -> SessionResult {
        let steps: Vec<Step> = (0..len)
            .map(|i| Step {
                ch: 'a',
                time_stamp: i * 200,
                typo: false,
            })
            .collect();
        SessionResult::from_steps(&steps, None, Settings::default()).unwrap()
    }

    fn local_storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().to_path_buf()).unwrap();
        (dir, LocalStorage::new(store))
    }

    #[test]
    fn test_select_storage() {
        assert_eq!(
            select_storage(&OpenRequest::Private { user_id: None }),
            StorageKind::Local
        );
        assert_eq!(
            select_storage(&OpenRequest::Private {
                user_id: Some("u1".into())
            }),
            StorageKind::Synced {
                user_id: "u1".into()
            }
        );
        assert_eq!(
            select_storage(&OpenRequest::Public {
                user_id: "u2".into()
            }),
            StorageKind::PublicView {
                user_id: "u2".into()
            }
        );
    }

    #[test]
    fn test_local_append_and_clear() {
        let (_dir, mut storage) = local_storage();
        storage.append(&[result(3)]).unwrap();
        storage.append(&[result(5), result(2)]).unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(
            loaded.iter().map(|r| r.length).collect::<Vec<_>>(),
            vec![3, 5, 2]
        );
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_local_rejects_unknown_schema() {
        let (dir, mut storage) = local_storage();
        fs::write(
            dir.path().join("results.json"),
            r#"{"schema_version": 7, "results": []}"#,
        )
        .unwrap();
        let err = storage.load().unwrap_err();
        assert!(matches!(
            err,
            StorageError::UnsupportedVersion {
                found: 7,
                expected: SCHEMA_VERSION
            }
        ));
        assert!(storage.append(&[result(1)]).is_err());
    }

    #[test]
    fn test_synced_moves_local_results_on_first_load() {
        let mut local = MemoryStorage::default();
        local.append(&[result(2)]).unwrap();
        let mut remote = MemoryStorage::default();
        remote.append(&[result(4)]).unwrap();

        let mut storage = open_storage(
            &OpenRequest::Private {
                user_id: Some("u1".into()),
            },
            Box::new(local.clone()),
            |_| Box::new(remote.clone()),
        );

        let loaded = storage.load().unwrap();
        assert_eq!(
            loaded.iter().map(|r| r.length).collect::<Vec<_>>(),
            vec![4, 2]
        );
        assert!(local.is_empty());

        storage.append(&[result(6)]).unwrap();
        assert!(local.is_empty());
        assert_eq!(remote.len(), 3);

        // Later loads do not merge again.
        local.append(&[result(9)]).unwrap();
        assert_eq!(storage.load().unwrap().len(), 3);
    }

    /// Local storage whose `clear` always fails.
    struct FailingClear(MemoryStorage);

    impl ResultStorage for FailingClear {
        fn load(&mut self) -> Result<Vec<SessionResult>, StorageError> {
            self.0.load()
        }

        fn append(&mut self, results: &[SessionResult]) -> Result<(), StorageError> {
            self.0.append(results)
        }

        fn clear(&mut self) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn test_synced_failed_clear_does_not_merge_twice() {
        let mut local = MemoryStorage::default();
        local.append(&[result(2)]).unwrap();
        let remote = MemoryStorage::default();
        let mut storage = SyncedStorage::new(
            Box::new(FailingClear(local.clone())),
            Box::new(remote.clone()),
        );

        assert!(matches!(storage.load(), Err(StorageError::Io(_))));
        assert_eq!(remote.len(), 1);

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(remote.len(), 1);
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn test_public_view_never_writes() {
        let mut remote = MemoryStorage::default();
        remote.append(&[result(3)]).unwrap();
        let mut storage = open_storage(
            &OpenRequest::Public {
                user_id: "u2".into(),
            },
            Box::new(MemoryStorage::default()),
            |_| Box::new(remote.clone()),
        );
        storage.append(&[result(5)]).unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap().len(), 1);
        assert_eq!(remote.len(), 1);
    }

    #[test]
    fn test_anonymous_uses_local_only() {
        let local = MemoryStorage::default();
        let mut storage = open_storage(
            &OpenRequest::Private { user_id: None },
            Box::new(local.clone()),
            |_| panic!("no remote for anonymous users"),
        );
        storage.append(&[result(2)]).unwrap();
        assert_eq!(local.len(), 1);
    }
}
