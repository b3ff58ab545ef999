use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde_json::Value;

use crate::document::{
    subscription, CollectionPath, DocPath, Document, Query, SnapshotSender, StoredDocument,
    Subscription, Write,
};
use crate::error::StoreError;
use crate::repo::DocumentStore;

/// In-memory DocumentStore for testing and native builds.
///
/// Live queries are pushed synchronously from inside each write, so a subscriber
/// sees every committed change in order.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    docs: BTreeMap<DocPath, Document>,
    subscribers: Vec<SnapshotSender>,
    last_stamp: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    /// Number of documents directly inside `collection`.
    pub fn collection_len(&self, collection: &CollectionPath) -> usize {
        self.lock()
            .map(|inner| inner.docs_in(collection).count())
            .unwrap_or(0)
    }
}

impl Inner {
    /// Server clock in epoch millis. Strictly increasing across writes.
    fn stamp(&mut self) -> i64 {
        self.last_stamp = Utc::now().timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp
    }

    fn apply_stamp(&mut self, write: Write) -> Document {
        let Write {
            mut fields,
            server_timestamp,
        } = write;
        if let Some(field) = server_timestamp {
            fields.insert(field, Value::from(self.stamp()));
        }
        fields
    }

    fn docs_in<'a>(
        &'a self,
        collection: &'a CollectionPath,
    ) -> impl Iterator<Item = (&'a DocPath, &'a Document)> + 'a {
        self.docs
            .iter()
            .filter(move |(path, _)| path.collection() == *collection)
    }

    fn snapshot(&self, query: &Query) -> Vec<StoredDocument> {
        let docs = self.docs_in(&query.collection).map(|(path, fields)| StoredDocument {
            id: path.id().to_string(),
            fields: fields.clone(),
        });
        query.arrange(docs)
    }

    /// Push fresh snapshots to every live query on `collection`, dropping closed ones.
    fn notify(&mut self, collection: &CollectionPath) {
        let subscribers = std::mem::take(&mut self.subscribers);
        let live: Vec<SnapshotSender> = subscribers
            .into_iter()
            .filter(|sub| {
                if sub.is_closed() {
                    return false;
                }
                if sub.query().collection != *collection {
                    return true;
                }
                sub.send(self.snapshot(sub.query()))
            })
            .collect();
        self.subscribers = live;
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        Ok(self.lock()?.docs.get(path).cloned())
    }

    async fn set(&self, path: &DocPath, write: Write) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let fields = inner.apply_stamp(write);
        inner.docs.insert(path.clone(), fields);
        inner.notify(&path.collection());
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, write: Write) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut inner = self.lock()?;
        let fields = inner.apply_stamp(write);
        inner.docs.insert(collection.doc(&id), fields);
        inner.notify(collection);
        Ok(id)
    }

    async fn update(&self, path: &DocPath, write: Write) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if !inner.docs.contains_key(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let fields = inner.apply_stamp(write);
        if let Some(existing) = inner.docs.get_mut(path) {
            existing.extend(fields);
        }
        inner.notify(&path.collection());
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.docs.remove(path);
        inner.notify(&path.collection());
        Ok(())
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let mut inner = self.lock()?;
        let (tx, sub) = subscription(query);
        tx.send(inner.snapshot(tx.query()));
        inner.subscribers.push(tx);
        Ok(sub)
    }
}
