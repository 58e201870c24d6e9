//! Shared variable store feeding `set` and `ifeq`.
//!
//! Every interpreter instance in a process sees the same global map, so one
//! macro's `set` is observable by another's `ifeq`. For peers in other
//! processes the store can be backed by a JSON file replaced atomically on
//! every write (write to a temp file, then rename): readers never observe
//! torn data and concurrent writers degrade to last-writer-wins, which is all
//! the store promises.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A value written by `set` and compared by `ifeq`.
///
/// `ifeq` compares canonical string forms, so `set(foo, 2)` matches
/// `ifeq(foo, 2, ...)` whether the stored datum round-tripped through a file
/// as a number or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    /// Equality as observed by `ifeq`.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int(a), Value::Text(b)) | (Value::Text(b), Value::Int(a)) => {
                b == &a.to_string()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

type Map = HashMap<String, Value>;

static GLOBAL: LazyLock<Arc<RwLock<Map>>> = LazyLock::new(Arc::default);

#[derive(Debug, Clone)]
enum Backend {
    Memory(Arc<RwLock<Map>>),
    File(Arc<PathBuf>),
}

/// Handle to a variable store. Cloning yields another handle to the same
/// storage.
#[derive(Debug, Clone)]
pub struct VarStore {
    backend: Backend,
}

impl VarStore {
    /// The process-wide store every macro shares by default.
    pub fn global() -> Self {
        Self {
            backend: Backend::Memory(Arc::clone(&GLOBAL)),
        }
    }

    /// A fresh private store, useful for tests and sandboxed embedders.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::default()),
        }
    }

    /// A store backed by a JSON file, observable across processes.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File(Arc::new(path.into())),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match &self.backend {
            Backend::Memory(map) => map.read().get(name).cloned(),
            Backend::File(path) => read_map(path).remove(name),
        }
    }

    /// Store `name -> value`. I/O trouble in the file backend is logged and
    /// swallowed: evaluation never aborts on a failed `set`.
    pub fn set(&self, name: &str, value: Value) {
        match &self.backend {
            Backend::Memory(map) => {
                map.write().insert(name.to_string(), value);
            }
            Backend::File(path) => {
                let mut map = read_map(path);
                map.insert(name.to_string(), value);
                write_map(path, &map);
            }
        }
    }
}

impl Default for VarStore {
    fn default() -> Self {
        Self::global()
    }
}

/// A missing or unreadable file is an empty store.
fn read_map(path: &Path) -> Map {
    let Ok(text) = std::fs::read_to_string(path) else {
        return Map::new();
    };
    serde_json::from_str(&text).unwrap_or_else(|err| {
        warn!(path = %path.display(), %err, "discarding unreadable variable store");
        Map::new()
    })
}

/// Replace the whole file atomically so peers never read a partial write.
fn write_map(path: &Path, map: &Map) {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let result = tempfile::NamedTempFile::new_in(dir).and_then(|file| {
        serde_json::to_writer(file.as_file(), map)?;
        file.persist(path).map_err(|err| err.error)?;
        Ok(())
    });
    if let Err(err) = result {
        warn!(path = %path.display(), %err, "failed to write variable store");
    }
}
