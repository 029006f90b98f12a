//! Persistence for the profile history ring

use gloo_storage::{LocalStorage, Storage};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::errors::{ProfileError, ProfileResult};
use super::history::ProfileHistory;

const STORAGE_KEY_PREFIX: &str = "profile_history_";

/// Load/save the history kept for a viewer
pub trait HistoryStorage {
    fn load(&self, owner: &str) -> ProfileResult<Option<ProfileHistory>>;
    fn save(&self, owner: &str, history: &ProfileHistory) -> ProfileResult<()>;
}

/// Browser localStorage, one key per viewer
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalHistoryStorage;

impl LocalHistoryStorage {
    fn key(owner: &str) -> String {
        format!("{}{}", STORAGE_KEY_PREFIX, owner)
    }
}

impl HistoryStorage for LocalHistoryStorage {
    fn load(&self, owner: &str) -> ProfileResult<Option<ProfileHistory>> {
        match LocalStorage::get::<ProfileHistory>(Self::key(owner)) {
            Ok(history) => Ok(Some(history)),
            Err(gloo_storage::errors::StorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(ProfileError::Storage(format!("{:?}", e))),
        }
    }

    fn save(&self, owner: &str, history: &ProfileHistory) -> ProfileResult<()> {
        LocalStorage::set(Self::key(owner), history)
            .map_err(|e| ProfileError::Storage(format!("{:?}", e)))
    }
}

/// In-memory storage; clones share the same map
#[derive(Clone, Debug, Default)]
pub struct MemoryHistoryStorage {
    entries: Rc<RefCell<HashMap<String, ProfileHistory>>>,
}

impl MemoryHistoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &str) -> Option<ProfileHistory> {
        self.entries.borrow().get(owner).cloned()
    }
}

impl HistoryStorage for MemoryHistoryStorage {
    fn load(&self, owner: &str) -> ProfileResult<Option<ProfileHistory>> {
        Ok(self.get(owner))
    }

    fn save(&self, owner: &str, history: &ProfileHistory) -> ProfileResult<()> {
        self.entries
            .borrow_mut()
            .insert(owner.to_string(), history.clone());
        Ok(())
    }
}
