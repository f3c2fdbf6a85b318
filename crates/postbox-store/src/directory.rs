//! Naming/directory service
//!
//! A flat `name -> key -> string` mapping, like domain text records. There
//! is no transaction across keys: readers may observe a partial set.

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up one text record
    async fn lookup(&self, name: &str, key: &str) -> Result<Option<String>>;

    /// Publish (or replace) one text record
    async fn publish(&self, name: &str, key: &str, value: &str) -> Result<()>;
}

/// Directory held in memory
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    records: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn lookup(&self, name: &str, key: &str) -> Result<Option<String>> {
        let records = self.records.read().await;
        Ok(records.get(name).and_then(|r| r.get(key)).cloned())
    }

    async fn publish(&self, name: &str, key: &str, value: &str) -> Result<()> {
        self.records
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

type Records = BTreeMap<String, BTreeMap<String, String>>;

/// Directory persisted as a single JSON file
#[derive(Debug)]
pub struct FileDirectory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileDirectory {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Records> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Records::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Directory for FileDirectory {
    async fn lookup(&self, name: &str, key: &str) -> Result<Option<String>> {
        let records = self.load().await?;
        Ok(records.get(name).and_then(|r| r.get(key)).cloned())
    }

    async fn publish(&self, name: &str, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load().await?;
        records
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());

        let encoded = serde_json::to_vec_pretty(&records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
