use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::{
    backend::{DataSource, ObjectStore, StoredObject},
    models::{ExplorerError, Result},
};

/// In-process database used by tests and the `--demo` mode
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    root: RwLock<Value>,
    failure: RwLock<Option<String>>,
    reads: AtomicUsize,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `users` set to the given tree
    pub fn with_users(users: Value) -> Self {
        let source = Self::new();
        if let Ok(mut root) = source.root.write() {
            *root = json!({ "users": users });
        }
        source
    }

    /// A handful of explorers for trying the leaderboard without a backend
    pub fn demo() -> Self {
        Self::with_users(json!({
            "a1f3": {
                "profile": { "email": "ares@redplanet.io", "accountCreated": "2025-03-02T09:15:00Z" },
                "scores": { "totalScore": 1840.5 },
                "inventory": { "samples": {
                    "basalt": { "amount": 14, "highScore": 420 },
                    "water": { "amount": 3, "highScore": 610.5 },
                    "gypsum": { "amount": 6, "highScore": 205 }
                }}
            },
            "b7c2": {
                "profile": { "email": "olympus@mons.io", "accountCreated": "2025-04-18T17:40:00Z" },
                "scores": { "totalScore": "2215" },
                "inventory": { "samples": {
                    "regolith": { "amount": 22, "highScore": 515 },
                    "smeciteClay": { "amount": 4, "highScore": 330 },
                    "carbonateRock": { "amount": 1, "highScore": 90 }
                }}
            },
            "c9d4": {
                "profile": { "email": "jezero", "accountCreated": "2025-06-01T12:00:00Z" },
                "scores": { "totalScore": 1840.5 },
                "inventory": { "samples": {
                    "basalt": { "amount": 9, "highScore": 470 },
                    "water": { "amount": 7 }
                }}
            },
            "d0e8": {
                "profile": { "email": "newcomer@gale.crater" }
            }
        }))
    }

    /// Make every subsequent call fail with a permission error, or clear it
    pub fn set_failure(&self, message: Option<&str>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = message.map(str::to_string);
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check_failure(&self, path: &str) -> Result<()> {
        match self.failure.read().ok().and_then(|f| f.clone()) {
            Some(_) => Err(ExplorerError::PermissionDenied(path.to_string())),
            None => Ok(()),
        }
    }

    fn segments(path: &str) -> Vec<&str> {
        path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn read(&self, path: &str) -> Result<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failure(path)?;

        let root = self
            .root
            .read()
            .map_err(|_| ExplorerError::LoadFailed { path: path.to_string(), message: "lock poisoned".to_string() })?;

        let mut node = &*root;
        for segment in Self::segments(path) {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(if node.is_null() { None } else { Some(node.clone()) })
    }

    async fn write(&self, path: &str, value: Value) -> Result<()> {
        self.check_failure(path)?;
        let write_failed = || ExplorerError::WriteFailed { path: path.to_string(), message: "lock poisoned".to_string() };
        let mut root = self.root.write().map_err(|_| write_failed())?;

        let segments = Self::segments(path);
        let Some((last, parents)) = segments.split_last() else {
            *root = value;
            return Ok(());
        };

        let mut node = &mut *root;
        for segment in parents {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node = node
                .as_object_mut()
                .ok_or_else(write_failed)?
                .entry(segment.to_string())
                .or_insert(Value::Null);
        }
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node.as_object_mut()
            .ok_or_else(write_failed)?
            .insert(last.to_string(), value);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.check_failure(path)?;
        let mut root = self
            .root
            .write()
            .map_err(|_| ExplorerError::WriteFailed { path: path.to_string(), message: "lock poisoned".to_string() })?;

        let segments = Self::segments(path);
        let Some((last, parents)) = segments.split_last() else {
            *root = Value::Null;
            return Ok(());
        };

        let mut node = &mut *root;
        for segment in parents {
            match node.get_mut(*segment) {
                Some(child) => node = child,
                None => return Ok(()),
            }
        }
        if let Some(map) = node.as_object_mut() {
            map.remove(*last);
        }
        Ok(())
    }
}

/// In-process object store
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.read().map(|o| o.contains_key(name)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| ExplorerError::Storage("lock poisoned".to_string()))?;
        objects.insert(name.to_string(), (bytes, content_type.to_string()));

        Ok(StoredObject {
            name: name.to_string(),
            download_url: format!("memory://{}", name),
        })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| ExplorerError::Storage("lock poisoned".to_string()))?;
        objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ExplorerError::Storage(format!("{} not found", name)))
    }
}
