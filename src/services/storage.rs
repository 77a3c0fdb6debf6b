//! Durable key-value stores the catalog persists into.

use futures::future::{BoxFuture, FutureExt};
use bson::doc;
use mongodb::options::{ClientOptions, ReplaceOptions};
use mongodb::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::StorageError;

/// String key-value surface, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>>;

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), StorageError>>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move {
            let entries = self
                .entries
                .lock()
                .map_err(|e| StorageError::Unavailable(format!("memory store lock: {e}")))?;
            Ok(entries.get(key).cloned())
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let mut entries = self
                .entries
                .lock()
                .map_err(|e| StorageError::Unavailable(format!("memory store lock: {e}")))?;
            entries.insert(key.to_string(), value);
            Ok(())
        }
        .boxed()
    }
}

/// One JSON file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move {
            match tokio::fs::read_to_string(self.path_for(key)).await {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(source) => Err(StorageError::Io {
                    key: key.to_string(),
                    source,
                }),
            }
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let io_err = |source| StorageError::Io {
                key: key.to_string(),
                source,
            };

            tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

            // Readers never observe a half-written file.
            let target = self.path_for(key);
            let staging = self.dir.join(format!("{key}.json.tmp"));
            tokio::fs::write(&staging, value).await.map_err(io_err)?;
            tokio::fs::rename(&staging, &target).await.map_err(io_err)?;

            Ok(())
        }
        .boxed()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    #[serde(rename = "_id")]
    key: String,
    value: String,
}

/// Keys live as documents of the `kv` collection, `_id` being the key.
#[derive(Debug, Clone)]
pub struct MongoStore {
    kv: mongodb::Collection<StoredValue>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StorageError> {
        let mut client_options = ClientOptions::parse(uri).await?;
        client_options.app_name = Some("nft-mp-catalog".to_string());
        let client = Client::with_options(client_options)?;
        let db = client.database(database);

        Ok(Self {
            kv: db.collection::<StoredValue>("kv"),
        })
    }
}

impl KeyValueStore for MongoStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move {
            let stored = self.kv.find_one(doc! {"_id": key}, None).await?;
            Ok(stored.map(|stored| stored.value))
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let stored = StoredValue {
                key: key.to_string(),
                value,
            };
            let options = ReplaceOptions::builder().upsert(true).build();

            self.kv
                .replace_one(doc! {"_id": key}, stored, options)
                .await?;
            Ok(())
        }
        .boxed()
    }
}
