use super::backend::StorageBackend;
use crate::error::{DiaryError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the diary core is single-threaded.
/// Individual entries can be marked as locked to simulate files the OS refuses
/// to read or delete.
#[derive(Default)]
pub struct MemBackend {
    index: RefCell<Option<String>>,
    content: RefCell<BTreeMap<String, String>>,
    locked: RefCell<HashSet<String>>,
    simulate_write_error: RefCell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Make reads and deletes of `name` fail, as if the OS held a lock on it.
    pub fn lock(&self, name: &str) {
        self.locked.borrow_mut().insert(name.to_string());
    }

    pub fn unlock(&self, name: &str) {
        self.locked.borrow_mut().remove(name);
    }

    /// Place content directly, bypassing the store (e.g. files dropped in by hand).
    pub fn insert_raw(&self, name: &str, content: &str) {
        self.content
            .borrow_mut()
            .insert(name.to_string(), content.to_string());
    }

    /// The raw index document as last saved.
    pub fn raw_index(&self) -> Option<String> {
        self.index.borrow().clone()
    }

    pub fn set_raw_index(&self, raw: &str) {
        *self.index.borrow_mut() = Some(raw.to_string());
    }

    fn check_lock(&self, name: &str) -> Result<()> {
        if self.locked.borrow().contains(name) {
            return Err(DiaryError::Store(format!("{} is locked", name)));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(DiaryError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn load_index(&self) -> Result<Option<String>> {
        Ok(self.index.borrow().clone())
    }

    fn save_index(&self, raw: &str) -> Result<()> {
        self.check_write()?;
        *self.index.borrow_mut() = Some(raw.to_string());
        Ok(())
    }

    fn read_content(&self, name: &str) -> Result<Option<String>> {
        self.check_lock(name)?;
        Ok(self.content.borrow().get(name).cloned())
    }

    fn write_content(&self, name: &str, content: &str) -> Result<()> {
        self.check_write()?;
        self.check_lock(name)?;
        self.insert_raw(name, content);
        Ok(())
    }

    fn delete_content(&self, name: &str) -> Result<bool> {
        self.check_lock(name)?;
        Ok(self.content.borrow_mut().remove(name).is_some())
    }

    fn content_exists(&self, name: &str) -> bool {
        self.content.borrow().contains_key(name)
    }

    fn list_names(&self) -> Result<Vec<String>> {
        Ok(self.content.borrow().keys().cloned().collect())
    }

    fn content_path(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("memory://{}", name))
    }
}
