use super::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Creation options of an object store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Field of the stored object that carries its key
    pub key_path: Option<String>,
    /// Whether the store generates keys for values that lack one
    pub auto_increment: bool,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_path(mut self, key_path: &str) -> Self {
        self.key_path = Some(key_path.to_string());
        self
    }

    pub fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }
}

/// Direction of a cursor walk over an object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorDirection {
    /// Ascending key order
    #[default]
    Next,
    /// Descending key order
    Prev,
}

/// Contents of one object store: records keyed by integer key, plus the
/// key generator state.
///
/// The generator only moves forward. Deleting records never lowers it, so a
/// key is handed out at most once for the lifetime of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreData {
    name: String,
    options: StoreOptions,
    next_key: u64,
    records: BTreeMap<u64, Value>,
}

impl ObjectStoreData {
    pub fn new(name: &str, options: StoreOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
            next_key: 1,
            records: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Key the generator will hand out next
    pub fn next_key(&self) -> u64 {
        self.next_key
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: u64) -> Option<&Value> {
        self.records.get(&key)
    }

    /// Insert a new value; an existing key is a constraint violation.
    pub fn add(&mut self, value: Value, quota: Option<usize>) -> StoreResult<u64> {
        let (key, value) = self.resolve_key(value)?;
        if self.records.contains_key(&key) {
            return Err(StoreError::ConstraintViolation(format!(
                "key {} already exists in object store '{}'",
                key, self.name
            )));
        }
        if let Some(limit) = quota {
            if self.records.len() >= limit {
                return Err(StoreError::QuotaExceeded {
                    store: self.name.clone(),
                    limit,
                });
            }
        }
        self.commit_key(key);
        self.records.insert(key, value);
        Ok(key)
    }

    /// Insert or replace a value
    pub fn put(&mut self, value: Value, quota: Option<usize>) -> StoreResult<u64> {
        let (key, value) = self.resolve_key(value)?;
        if let Some(limit) = quota {
            if !self.records.contains_key(&key) && self.records.len() >= limit {
                return Err(StoreError::QuotaExceeded {
                    store: self.name.clone(),
                    limit,
                });
            }
        }
        self.commit_key(key);
        self.records.insert(key, value);
        Ok(key)
    }

    /// Remove a value. Returns whether a value was present.
    pub fn delete(&mut self, key: u64) -> bool {
        self.records.remove(&key).is_some()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// The entry that follows `after` in the given direction, or the first
    /// one in that direction when `after` is `None`.
    pub fn step(&self, after: Option<u64>, direction: CursorDirection) -> Option<(u64, &Value)> {
        let entry = match (direction, after) {
            (CursorDirection::Next, None) => self.records.iter().next(),
            (CursorDirection::Next, Some(key)) => self
                .records
                .range((Bound::Excluded(key), Bound::Unbounded))
                .next(),
            (CursorDirection::Prev, None) => self.records.iter().next_back(),
            (CursorDirection::Prev, Some(key)) => self.records.range(..key).next_back(),
        };
        entry.map(|(key, value)| (*key, value))
    }

    fn resolve_key(&self, mut value: Value) -> StoreResult<(u64, Value)> {
        let Some(key_path) = self.options.key_path.as_deref() else {
            if self.options.auto_increment {
                return Ok((self.next_key, value));
            }
            return Err(StoreError::DataError(format!(
                "object store '{}' has neither a key path nor a key generator",
                self.name
            )));
        };

        let object = value.as_object_mut().ok_or_else(|| {
            StoreError::DataError(format!(
                "values in object store '{}' must be objects to carry key path '{}'",
                self.name, key_path
            ))
        })?;

        match object.get(key_path) {
            Some(existing) => {
                let key = existing.as_u64().ok_or_else(|| {
                    StoreError::DataError(format!(
                        "key path '{}' must hold a non-negative integer, found {}",
                        key_path, existing
                    ))
                })?;
                Ok((key, value))
            }
            None if self.options.auto_increment => {
                let key = self.next_key;
                object.insert(key_path.to_string(), Value::from(key));
                Ok((key, value))
            }
            None => Err(StoreError::DataError(format!(
                "value has no key at key path '{}'",
                key_path
            ))),
        }
    }

    fn commit_key(&mut self, key: u64) {
        if self.options.auto_increment && key >= self.next_key {
            self.next_key = key + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memo_store() -> ObjectStoreData {
        ObjectStoreData::new("memoes", StoreOptions::new().key_path("id").auto_increment(true))
    }

    #[test]
    fn test_add_generates_key_and_writes_key_path() {
        let mut store = memo_store();
        let key = store.add(json!({"title": "a"}), None).unwrap();
        assert_eq!(key, 1);
        assert_eq!(store.get(1).unwrap()["id"], 1);
        assert_eq!(store.next_key(), 2);
    }

    #[test]
    fn test_keys_never_reused_after_delete() {
        let mut store = memo_store();
        store.add(json!({"title": "a"}), None).unwrap();
        let second = store.add(json!({"title": "b"}), None).unwrap();
        assert!(store.delete(second));
        let third = store.add(json!({"title": "c"}), None).unwrap();
        assert_eq!(third, 3);
    }

    #[test]
    fn test_explicit_key_advances_generator() {
        let mut store = memo_store();
        store.add(json!({"id": 10, "title": "a"}), None).unwrap();
        assert_eq!(store.add(json!({"title": "b"}), None).unwrap(), 11);
    }

    #[test]
    fn test_add_duplicate_key_is_constraint_violation() {
        let mut store = memo_store();
        store.add(json!({"id": 1}), None).unwrap();
        let err = store.add(json!({"id": 1}), None).unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
    }

    #[test]
    fn test_put_replaces() {
        let mut store = memo_store();
        store.add(json!({"title": "a"}), None).unwrap();
        store.put(json!({"id": 1, "title": "b"}), None).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap()["title"], "b");
    }

    #[test]
    fn test_quota_rejects_add() {
        let mut store = memo_store();
        store.add(json!({"title": "a"}), Some(1)).unwrap();
        let err = store.add(json!({"title": "b"}), Some(1)).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { limit: 1, .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.next_key(), 2);
    }

    #[test]
    fn test_non_object_value_rejected() {
        let mut store = memo_store();
        assert!(matches!(
            store.add(json!("text"), None),
            Err(StoreError::DataError(_))
        ));
    }

    #[test]
    fn test_step_both_directions() {
        let mut store = memo_store();
        for title in ["a", "b", "c"] {
            store.add(json!({ "title": title }), None).unwrap();
        }
        store.delete(2);

        let forward: Vec<u64> = std::iter::successors(store.step(None, CursorDirection::Next), |(k, _)| {
            store.step(Some(*k), CursorDirection::Next)
        })
        .map(|(k, _)| k)
        .collect();
        assert_eq!(forward, vec![1, 3]);

        let backward: Vec<u64> = std::iter::successors(store.step(None, CursorDirection::Prev), |(k, _)| {
            store.step(Some(*k), CursorDirection::Prev)
        })
        .map(|(k, _)| k)
        .collect();
        assert_eq!(backward, vec![3, 1]);
    }

    #[test]
    fn test_store_without_generator_requires_key() {
        let mut store = ObjectStoreData::new("plain", StoreOptions::new().key_path("id"));
        assert!(store.add(json!({"title": "a"}), None).is_err());
        assert_eq!(store.add(json!({"id": 5}), None).unwrap(), 5);
        assert_eq!(store.next_key(), 1);
    }
}
