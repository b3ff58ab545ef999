//! # Document addressing, writes, queries and live subscriptions
//!
//! The document database is a tree of collections and documents, addressed by
//! slash-separated paths that alternate collection and document ids:
//!
//! ```text
//! users/{uid}                 -- profile document
//! users/{uid}/notes           -- the user's note collection
//! users/{uid}/notes/{id}      -- one note
//! ```
//!
//! Scoping every note under its owner's path is the only thing that ties a note to
//! a user; there is no ownership check anywhere else.
//!
//! A [`Subscription`] is the receiving half of a live query. Each message is a full
//! snapshot of the query result; dropping or [`cancel`](Subscription::cancel)ling the
//! subscription closes the channel, which the store observes on its next delivery.

use std::cmp::Ordering;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::StoreError;

/// A document body: a JSON object of named fields.
pub type Document = serde_json::Map<String, Value>;

pub const USERS: &str = "users";
pub const NOTES: &str = "notes";

/// Path to a collection, e.g. `users/abc/notes`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

/// Path to a document, e.g. `users/abc/notes/xyz`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl CollectionPath {
    /// The top-level `users` collection.
    pub fn users() -> Self {
        Self(USERS.to_string())
    }

    /// The note collection owned by `uid`.
    pub fn notes_of(uid: &str) -> Self {
        Self(format!("{USERS}/{uid}/{NOTES}"))
    }

    pub fn doc(&self, id: &str) -> DocPath {
        DocPath(format!("{}/{}", self.0, id))
    }

    /// Last segment, e.g. `notes`.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Document this collection hangs off, or `None` for a root collection.
    pub fn parent(&self) -> Option<DocPath> {
        self.0.rsplit_once('/').map(|(parent, _)| DocPath(parent.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocPath {
    /// The profile document of `uid`.
    pub fn profile_of(uid: &str) -> Self {
        CollectionPath::users().doc(uid)
    }

    /// A note owned by `uid`.
    pub fn note_of(uid: &str, id: &str) -> Self {
        CollectionPath::notes_of(uid).doc(id)
    }

    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn collection(&self) -> CollectionPath {
        let parent = self.0.rsplit_once('/').map(|(p, _)| p).unwrap_or_default();
        CollectionPath(parent.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields to write, optionally asking storage to stamp one field with its clock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Write {
    pub fields: Document,
    pub server_timestamp: Option<String>,
}

impl Write {
    pub fn new(fields: Document) -> Self {
        Self {
            fields,
            server_timestamp: None,
        }
    }

    /// Serialise `value` into the write's fields. It must serialise to an object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, StoreError> {
        to_document(value).map(Self::new)
    }

    pub fn stamped(mut self, field: &str) -> Self {
        self.server_timestamp = Some(field.to_string());
        self
    }
}

/// A document as returned from a read or a query.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

impl StoredDocument {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        from_document(self.fields.clone())
    }
}

/// A query over one collection, ordered by a single field.
///
/// Like the hosted database, documents that lack the ordering field are not part
/// of the result.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub collection: CollectionPath,
    pub order_by: String,
    pub descending: bool,
}

impl Query {
    pub fn new(collection: CollectionPath, order_by: &str) -> Self {
        Self {
            collection,
            order_by: order_by.to_string(),
            descending: false,
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Filter and order `docs` the way the hosted database would.
    pub fn arrange(&self, docs: impl IntoIterator<Item = StoredDocument>) -> Vec<StoredDocument> {
        let mut docs: Vec<StoredDocument> = docs
            .into_iter()
            .filter(|d| d.fields.get(&self.order_by).is_some_and(|v| !v.is_null()))
            .collect();
        docs.sort_by(|a, b| {
            let ord = compare_values(&a.fields[&self.order_by], &b.fields[&self.order_by])
                .then_with(|| a.id.cmp(&b.id));
            if self.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        docs
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        // Mixed types order numbers before strings before everything else.
        (Value::Number(_), _) => Ordering::Less,
        (_, Value::Number(_)) => Ordering::Greater,
        (Value::String(_), _) => Ordering::Less,
        (_, Value::String(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Receiving half of a live query.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Vec<StoredDocument>>,
}

/// Sending half of a live query, held by the store.
#[derive(Clone, Debug)]
pub struct SnapshotSender {
    query: Query,
    tx: mpsc::UnboundedSender<Vec<StoredDocument>>,
}

/// Open a subscription channel for `query`.
pub fn subscription(query: Query) -> (SnapshotSender, Subscription) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SnapshotSender { query, tx }, Subscription { rx })
}

impl Subscription {
    /// Wait for the next full snapshot. `None` once the store stops delivering.
    pub async fn next(&mut self) -> Option<Vec<StoredDocument>> {
        self.rx.recv().await
    }

    /// Stop receiving. Snapshots already queued are discarded.
    pub fn cancel(mut self) {
        self.rx.close();
    }
}

impl SnapshotSender {
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Deliver a snapshot. Returns `false` if the subscriber is gone.
    pub fn send(&self, snapshot: Vec<StoredDocument>) -> bool {
        self.tx.send(snapshot).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Serialise a value into a document body.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode(format!("expected an object, got {other}"))),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}

/// Deserialise a document body.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Decode(e.to_string()))
}
