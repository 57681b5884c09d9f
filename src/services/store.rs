use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("a document already exists for this key")]
    Conflict,
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// A stored document together with its collection-scoped id.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Orders documents newest first by their `createdAt` field. Timestamps are
/// RFC 3339 strings, so lexicographic order is chronological.
pub fn sort_newest_first(docs: &mut [Document]) {
    docs.sort_by(|a, b| {
        let a_created = a.data.get("createdAt").and_then(Value::as_str).unwrap_or("");
        let b_created = b.data.get("createdAt").and_then(Value::as_str).unwrap_or("");
        b_created.cmp(a_created)
    });
}

impl Document {
    /// Document data with the id folded in, the way API responses carry it.
    pub fn into_json(self) -> Value {
        let Document { id, mut data } = self;
        if let Value::Object(map) = &mut data {
            map.insert("id".to_string(), Value::String(id));
        }
        data
    }
}

/// Schemaless document storage: named collections of JSON objects.
///
/// Writes reject any document containing a JSON null anywhere, so documents
/// read back always have fully-defined fields. `add_unique` is a conditional
/// insert keyed by a caller-supplied uniqueness key and fails with
/// `StoreError::Conflict` when the key is already taken.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Upsert with a caller-chosen id.
    async fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<(), StoreError>;

    /// Insert with a generated id.
    async fn add(&self, collection: &str, doc: &Value) -> Result<String, StoreError>;

    /// Insert with a generated id, conditional on `unique_key` being unused
    /// within the collection.
    async fn add_unique(
        &self,
        collection: &str,
        unique_key: &str,
        doc: &Value,
    ) -> Result<String, StoreError>;

    /// Shallow field merge into an existing document.
    async fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<(), StoreError>;

    /// Equality-filtered scan. No ordering guarantee; `limit` of `None`
    /// returns every match.
    async fn query(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;
}

fn ensure_object(doc: &Value) -> Result<(), StoreError> {
    if !doc.is_object() {
        return Err(StoreError::InvalidDocument(
            "document must be a JSON object".to_string(),
        ));
    }
    ensure_no_nulls(doc, "")
}

fn ensure_no_nulls(value: &Value, path: &str) -> Result<(), StoreError> {
    match value {
        Value::Null => Err(StoreError::InvalidDocument(format!(
            "null value at '{}'",
            path
        ))),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                ensure_no_nulls(item, &format!("{}[{}]", path, index))?;
            }
            Ok(())
        }
        Value::Object(map) => {
            for (key, item) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                ensure_no_nulls(item, &child)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Drops null-valued entries recursively so tolerated client input can be
/// stored. Arrays keep their non-null elements.
pub fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, item)| !item.is_null())
                .map(|(key, item)| (key.clone(), strip_nulls(item)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    collections: HashMap<String, HashMap<String, Value>>,
    unique_keys: HashMap<(String, String), String>,
}

/// In-memory backend. Conditional inserts and key bookkeeping happen under a
/// single write lock, so `add_unique` is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<(), StoreError> {
        ensure_object(doc)?;
        let mut inner = self.write()?;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn add(&self, collection: &str, doc: &Value) -> Result<String, StoreError> {
        ensure_object(doc)?;
        let id = Uuid::new_v4().to_string();
        let mut inner = self.write()?;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), doc.clone());
        Ok(id)
    }

    async fn add_unique(
        &self,
        collection: &str,
        unique_key: &str,
        doc: &Value,
    ) -> Result<String, StoreError> {
        ensure_object(doc)?;
        let mut inner = self.write()?;
        let key = (collection.to_string(), unique_key.to_string());
        if inner.unique_keys.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        let id = Uuid::new_v4().to_string();
        inner.unique_keys.insert(key, id.clone());
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), doc.clone());
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<(), StoreError> {
        ensure_object(patch)?;
        let mut inner = self.write()?;
        let existing = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or(StoreError::NotFound)?;
        if let (Value::Object(current), Value::Object(fields)) = (existing, patch) {
            for (field, value) in fields {
                current.insert(field.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let inner = self.read()?;
        let mut results = Vec::new();
        if let Some(docs) = inner.collections.get(collection) {
            for (id, data) in docs {
                let matches = filters
                    .iter()
                    .all(|(field, value)| data.get(*field) == Some(value));
                if matches {
                    results.push(Document {
                        id: id.clone(),
                        data: data.clone(),
                    });
                    if limit.is_some_and(|limit| results.len() >= limit) {
                        break;
                    }
                }
            }
        }
        Ok(results)
    }
}

/// Postgres backend: one `documents` table with JSONB payloads, a partial
/// unique index on (collection, unique_key) backing conditional inserts,
/// `||` merges for updates and `@>` containment for equality queries.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT doc FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(row.map(|row| Document {
            id: id.to_string(),
            data: row.get(0),
        }))
    }

    async fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<(), StoreError> {
        ensure_object(doc)?;
        sqlx::query(
            "INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE SET doc = $3",
        )
        .bind(collection)
        .bind(id)
        .bind(doc.clone())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn add(&self, collection: &str, doc: &Value) -> Result<String, StoreError> {
        ensure_object(doc)?;
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(doc.clone())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(id)
    }

    async fn add_unique(
        &self,
        collection: &str,
        unique_key: &str,
        doc: &Value,
    ) -> Result<String, StoreError> {
        ensure_object(doc)?;
        let id = Uuid::new_v4().to_string();
        let result = sqlx::query(
            "INSERT INTO documents (collection, id, unique_key, doc) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (collection, unique_key) WHERE unique_key IS NOT NULL DO NOTHING",
        )
        .bind(collection)
        .bind(&id)
        .bind(unique_key)
        .bind(doc.clone())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<(), StoreError> {
        ensure_object(patch)?;
        let result =
            sqlx::query("UPDATE documents SET doc = doc || $3 WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .bind(patch.clone())
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut contains = serde_json::Map::new();
        for (field, value) in filters {
            contains.insert((*field).to_string(), value.clone());
        }

        let rows = sqlx::query(
            "SELECT id, doc FROM documents WHERE collection = $1 AND doc @> $2 \
             ORDER BY created_at LIMIT $3",
        )
        .bind(collection)
        .bind(Value::Object(contains))
        .bind(limit.map(|limit| limit as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| Document {
                id: row.get(0),
                data: row.get(1),
            })
            .collect())
    }
}
