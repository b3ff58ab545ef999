//! # Hosted document database
//!
//! [`Firestore`] implements [`DocumentStore`] over the Cloud Firestore v1 REST API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `get` | `GET .../documents/{path}`; 404 means absent |
//! | `set` / `add` / `update` | `POST .../documents:commit` with one write |
//! | `delete` | `DELETE .../documents/{path}` |
//! | `subscribe` | `POST .../{parent}:runQuery` |
//!
//! Server timestamps are requested with an `updateTransforms` entry set to
//! `REQUEST_TIME`, so `createdAt` / `updatedAt` come from the database clock.
//! `add` writes under a client-generated id with an `exists: false`
//! precondition; `update` uses a field mask plus `exists: true`, which makes the
//! server answer 404 for a missing note.
//!
//! The REST surface has no streaming listen. Live queries are served by re-running
//! open queries: those on a collection right after this client writes to it, and
//! all of them whenever [`Firestore::refresh_open`] is called. The UI calls it on
//! a timer, so changes made by other clients arrive within one poll interval.

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::{json, Value};

use store::document::{subscription, SnapshotSender};
use store::{
    CollectionPath, DocPath, Document, DocumentStore, Query, StoreError, StoredDocument,
    Subscription, Write,
};

use crate::identity::Credentials;
use crate::rest;
use crate::value::{decode_fields, encode_fields};

pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Precondition {
    /// Create or replace.
    None,
    /// Create only.
    Missing,
    /// Merge the given fields into an existing document.
    Exists,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

impl RawDocument {
    fn into_stored(self) -> Result<StoredDocument, StoreError> {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        Ok(StoredDocument {
            id,
            fields: decode_fields(self.fields.as_ref())?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Firestore {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    credentials: Credentials,
    subscribers: Arc<Mutex<Vec<SnapshotSender>>>,
}

impl Firestore {
    pub fn new(project_id: impl Into<String>, credentials: Credentials) -> Self {
        Self::with_endpoint(FIRESTORE_ENDPOINT, project_id, credentials)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            credentials,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Resource name of the database's document root.
    fn root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn doc_name(&self, path: &DocPath) -> String {
        format!("{}/{path}", self.root())
    }

    fn doc_url(&self, path: &DocPath) -> String {
        format!("{}/{}", self.endpoint, self.doc_name(path))
    }

    fn commit_url(&self) -> String {
        format!("{}/{}:commit", self.endpoint, self.root())
    }

    fn query_url(&self, collection: &CollectionPath) -> String {
        match collection.parent() {
            Some(parent) => format!("{}/{}:runQuery", self.endpoint, self.doc_name(&parent)),
            None => format!("{}/{}:runQuery", self.endpoint, self.root()),
        }
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.credentials.bearer().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn commit(&self, path: &DocPath, write: &Write, precondition: Precondition) -> Result<(), StoreError> {
        let body = commit_body(&self.doc_name(path), write, precondition);
        rest::send(self.authorized(self.http.post(self.commit_url()).json(&body)).await)
            .await
            .map_err(|err| match err.status() {
                Some(reqwest::StatusCode::NOT_FOUND) => StoreError::NotFound(path.to_string()),
                _ => StoreError::from(err),
            })?;
        tracing::debug!(%path, ?precondition, "document committed");
        self.refresh(&path.collection()).await;
        Ok(())
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<StoredDocument>, StoreError> {
        let request = self
            .http
            .post(self.query_url(&query.collection))
            .json(&query_body(query));
        let items: Vec<QueryItem> = rest::send_json(self.authorized(request).await).await?;
        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(RawDocument::into_stored)
            .collect()
    }

    /// Re-run every open query on `collection` and push the results.
    async fn refresh(&self, collection: &CollectionPath) {
        self.push_to(Some(collection)).await;
    }

    /// Re-run every open query, whatever its collection, and push the results.
    pub async fn refresh_open(&self) {
        self.push_to(None).await;
    }

    async fn push_to(&self, collection: Option<&CollectionPath>) {
        let targets = match self.subscribers.lock() {
            Ok(mut subs) => open_targets(&mut subs, collection),
            Err(_) => return,
        };
        for sub in targets {
            if sub.is_closed() {
                continue;
            }
            match self.run_query(sub.query()).await {
                Ok(docs) => {
                    sub.send(docs);
                }
                Err(err) => {
                    tracing::warn!(collection = %sub.query().collection, %err, "live query refresh failed")
                }
            }
        }
    }
}

/// Drop closed subscribers and pick the open ones on `collection` (all of them
/// for `None`).
fn open_targets(subs: &mut Vec<SnapshotSender>, collection: Option<&CollectionPath>) -> Vec<SnapshotSender> {
    subs.retain(|sub| !sub.is_closed());
    subs.iter()
        .filter(|sub| collection.map_or(true, |c| sub.query().collection == *c))
        .cloned()
        .collect()
}

/// Quote a field path segment unless it is a plain identifier.
fn field_path(name: &str) -> String {
    let plain = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn commit_body(name: &str, write: &Write, precondition: Precondition) -> Value {
    let mut entry = json!({
        "update": { "name": name, "fields": encode_fields(&write.fields) },
    });
    if let Some(stamp) = &write.server_timestamp {
        entry["updateTransforms"] = json!([
            { "fieldPath": field_path(stamp), "setToServerValue": "REQUEST_TIME" }
        ]);
    }
    match precondition {
        Precondition::None => {}
        Precondition::Missing => entry["currentDocument"] = json!({ "exists": false }),
        Precondition::Exists => {
            let mask: Vec<String> = write.fields.keys().map(|k| field_path(k)).collect();
            entry["updateMask"] = json!({ "fieldPaths": mask });
            entry["currentDocument"] = json!({ "exists": true });
        }
    }
    json!({ "writes": [entry] })
}

fn query_body(query: &Query) -> Value {
    let direction = if query.descending { "DESCENDING" } else { "ASCENDING" };
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": query.collection.id() }],
            "orderBy": [{ "field": { "fieldPath": field_path(&query.order_by) }, "direction": direction }],
        }
    })
}

impl DocumentStore for Firestore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        let request = self.authorized(self.http.get(self.doc_url(path))).await;
        match rest::send_json::<RawDocument>(request).await {
            Ok(raw) => Ok(Some(raw.into_stored()?.fields)),
            Err(err) if err.status() == Some(reqwest::StatusCode::NOT_FOUND) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, path: &DocPath, write: Write) -> Result<(), StoreError> {
        self.commit(path, &write, Precondition::None).await
    }

    async fn add(&self, collection: &CollectionPath, write: Write) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.commit(&collection.doc(&id), &write, Precondition::Missing).await?;
        Ok(id)
    }

    async fn update(&self, path: &DocPath, write: Write) -> Result<(), StoreError> {
        self.commit(path, &write, Precondition::Exists).await
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        let request = self.authorized(self.http.delete(self.doc_url(path))).await;
        rest::send(request).await.map_err(StoreError::from)?;
        tracing::debug!(%path, "document deleted");
        self.refresh(&path.collection()).await;
        Ok(())
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let docs = self.run_query(&query).await?;
        let (tx, sub) = subscription(query);
        tx.send(docs);
        self.subscribers
            .lock()
            .map_err(|_| StoreError::Backend("subscriber list poisoned".to_string()))?
            .push(tx);
        Ok(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Firestore {
        Firestore::new("notekeep", Credentials::new("k"))
    }

    fn write(value: Value) -> Write {
        Write::new(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_urls() {
        let db = db();
        assert_eq!(
            db.doc_url(&DocPath::note_of("u1", "n1")),
            "https://firestore.googleapis.com/v1/projects/notekeep/databases/(default)/documents/users/u1/notes/n1"
        );
        assert_eq!(
            db.commit_url(),
            "https://firestore.googleapis.com/v1/projects/notekeep/databases/(default)/documents:commit"
        );
        assert_eq!(
            db.query_url(&CollectionPath::notes_of("u1")),
            "https://firestore.googleapis.com/v1/projects/notekeep/databases/(default)/documents/users/u1:runQuery"
        );
        assert_eq!(
            db.query_url(&CollectionPath::users()),
            "https://firestore.googleapis.com/v1/projects/notekeep/databases/(default)/documents:runQuery"
        );
    }

    #[test]
    fn test_create_write_is_stamped_and_guarded() {
        let body = commit_body(
            "projects/p/databases/(default)/documents/users/u1/notes/n1",
            &write(json!({ "title": "Trip" })).stamped("createdAt"),
            Precondition::Missing,
        );
        let entry = &body["writes"][0];
        assert_eq!(entry["update"]["fields"]["title"], json!({ "stringValue": "Trip" }));
        assert_eq!(
            entry["updateTransforms"],
            json!([{ "fieldPath": "createdAt", "setToServerValue": "REQUEST_TIME" }])
        );
        assert_eq!(entry["currentDocument"], json!({ "exists": false }));
        assert!(entry.get("updateMask").is_none());
    }

    #[test]
    fn test_update_write_masks_only_written_fields() {
        let body = commit_body(
            "n",
            &write(json!({ "title": "a", "content": "b" })).stamped("updatedAt"),
            Precondition::Exists,
        );
        let entry = &body["writes"][0];
        assert_eq!(entry["updateMask"], json!({ "fieldPaths": ["content", "title"] }));
        assert_eq!(entry["currentDocument"], json!({ "exists": true }));
        assert_eq!(entry["updateTransforms"][0]["fieldPath"], "updatedAt");
    }

    #[test]
    fn test_plain_set_has_no_precondition() {
        let body = commit_body("n", &write(json!({ "name": "Ada" })), Precondition::None);
        let entry = &body["writes"][0];
        assert!(entry.get("currentDocument").is_none());
        assert!(entry.get("updateTransforms").is_none());
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("createdAt"), "createdAt");
        assert_eq!(field_path("_x1"), "_x1");
        assert_eq!(field_path("my field"), "`my field`");
        assert_eq!(field_path("1st"), "`1st`");
        assert_eq!(field_path("a`b"), "`a\\`b`");
    }

    #[test]
    fn test_query_body() {
        let query = Query::new(CollectionPath::notes_of("u1"), "createdAt").descending();
        assert_eq!(
            query_body(&query),
            json!({
                "structuredQuery": {
                    "from": [{ "collectionId": "notes" }],
                    "orderBy": [{ "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }],
                }
            })
        );
    }

    #[test]
    fn test_query_response_decoding() {
        let items: Vec<QueryItem> = serde_json::from_value(json!([
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/users/u1/notes/n2",
                    "fields": {
                        "title": { "stringValue": "new" },
                        "createdAt": { "timestampValue": "2024-01-02T00:00:00Z" }
                    },
                    "createTime": "2024-01-02T00:00:00Z"
                },
                "readTime": "2024-01-02T00:00:01Z"
            },
            { "readTime": "2024-01-02T00:00:01Z" }
        ]))
        .unwrap();
        let docs: Vec<StoredDocument> = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|raw| raw.into_stored().unwrap())
            .collect();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "n2");
        assert_eq!(docs[0].fields["title"], "new");
        assert_eq!(docs[0].fields["createdAt"], 1704153600000i64);
    }

    #[test]
    fn test_open_targets_prunes_and_filters() {
        let query = |c: CollectionPath| Query::new(c, "createdAt");
        let (alice, alice_sub) = subscription(query(CollectionPath::notes_of("alice")));
        let (bob, _bob_sub) = subscription(query(CollectionPath::notes_of("bob")));
        let (gone, gone_sub) = subscription(query(CollectionPath::notes_of("alice")));
        gone_sub.cancel();
        let mut subs = vec![alice, bob, gone];

        let every = open_targets(&mut subs, None);
        assert_eq!(every.len(), 2);
        assert_eq!(subs.len(), 2);

        let only = open_targets(&mut subs, Some(&CollectionPath::notes_of("alice")));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].query().collection, CollectionPath::notes_of("alice"));

        drop(alice_sub);
        assert!(open_targets(&mut subs, Some(&CollectionPath::notes_of("alice"))).is_empty());
        assert_eq!(subs.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_open_without_subscribers_sends_nothing() {
        let db = db();
        db.refresh_open().await;
        assert!(db.subscribers.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_document_has_no_fields() {
        let raw: RawDocument = serde_json::from_value(json!({ "name": "x/users/u1" })).unwrap();
        let stored = raw.into_stored().unwrap();
        assert_eq!(stored.id, "u1");
        assert!(stored.fields.is_empty());
    }
}
