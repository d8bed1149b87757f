//! Line item records.

use crate::error::{CartError, Result};
use crate::fields::FieldMap;
use crate::ids::LineItemId;
use crate::keys;
use turbo_kv::{Batch, KvStore};

/// CRUD over `item:<id>` field maps and the global id counter.
///
/// Creation and deletion append to a caller-owned [`Batch`] so the cart can
/// commit them together with its membership and index changes.
#[derive(Clone, Copy)]
pub struct LineItemStore<'a> {
    store: &'a dyn KvStore,
}

impl<'a> LineItemStore<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    /// Allocate a new, never before issued, line item id.
    ///
    /// A counter that yields zero or less has been tampered with; it is
    /// reported as corrupt instead of handing out a reused id.
    pub fn allocate_id(&self) -> Result<LineItemId> {
        let id = self.store.incr(keys::ITEM_ID_COUNTER)?;
        match u64::try_from(id) {
            Ok(id) if id > 0 => Ok(LineItemId::new(id)),
            _ => Err(CartError::InvalidValue {
                field: keys::ITEM_ID_COUNTER.to_string(),
                value: id.to_string(),
            }),
        }
    }

    /// Queue the record write and its initial version.
    pub fn create(&self, batch: &mut Batch, id: LineItemId, fields: &FieldMap) {
        let key = keys::item(id);
        batch
            .hset(key.clone(), fields.to_pairs())
            .hincrby(key, keys::ITEM_VERSION_FIELD, 1);
    }

    /// Read an item's fields. Empty when the record does not exist.
    pub fn read(&self, id: LineItemId) -> Result<FieldMap> {
        Ok(FieldMap::from(self.store.hgetall(&keys::item(id))?))
    }

    /// Write one field, then bump the item version. Returns the new version.
    ///
    /// The two steps are separate round trips: a concurrent reader can see the
    /// new value with the old version.
    pub fn set_field(&self, id: LineItemId, name: &str, value: &str) -> Result<i64> {
        let key = keys::item(id);
        self.store
            .hset(&key, vec![(name.to_string(), value.to_string())])?;
        Ok(self.store.hincrby(&key, keys::ITEM_VERSION_FIELD, 1)?)
    }

    /// Remove one field, then bump the item version. Returns the new version.
    pub fn clear_field(&self, id: LineItemId, name: &str) -> Result<i64> {
        let key = keys::item(id);
        self.store.hdel(&key, name)?;
        Ok(self.store.hincrby(&key, keys::ITEM_VERSION_FIELD, 1)?)
    }

    /// Bump the item version without changing any field.
    pub fn bump_version(&self, id: LineItemId) -> Result<i64> {
        Ok(self
            .store
            .hincrby(&keys::item(id), keys::ITEM_VERSION_FIELD, 1)?)
    }

    /// Queue deletion of the record.
    pub fn delete(&self, batch: &mut Batch, id: LineItemId) {
        batch.del(keys::item(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbo_kv::MemoryStore;

    #[test]
    fn test_allocate_id_never_repeats() {
        let store = MemoryStore::new();
        let items = LineItemStore::new(&store);
        let a = items.allocate_id().unwrap();
        let b = items.allocate_id().unwrap();
        assert_eq!(a, LineItemId::new(1));
        assert_eq!(b, LineItemId::new(2));
    }

    #[test]
    fn test_create_sets_version_one() {
        let store = MemoryStore::new();
        let items = LineItemStore::new(&store);
        let id = items.allocate_id().unwrap();

        let mut batch = Batch::new();
        items.create(&mut batch, id, &FieldMap::new().with("id", 17).with("type", "Bottle"));
        store.exec(batch).unwrap();

        let fields = items.read(id).unwrap();
        assert_eq!(fields.get(keys::ITEM_VERSION_FIELD), Some("1"));
        assert_eq!(fields.product_type(), Some("Bottle"));
    }

    #[test]
    fn test_set_and_clear_field_bump_version() {
        let store = MemoryStore::new();
        let items = LineItemStore::new(&store);
        let id = LineItemId::new(5);

        let mut batch = Batch::new();
        items.create(&mut batch, id, &FieldMap::new().with("quantity", 2));
        store.exec(batch).unwrap();

        assert_eq!(items.set_field(id, "quantity", "3").unwrap(), 2);
        assert_eq!(items.clear_field(id, "quantity").unwrap(), 3);
        assert_eq!(items.bump_version(id).unwrap(), 4);
        assert!(!items.read(id).unwrap().contains("quantity"));
    }

    #[test]
    fn test_allocate_id_rejects_corrupt_counter() {
        let store = MemoryStore::new();
        store.set("item:id", "-5").unwrap();
        let items = LineItemStore::new(&store);

        for _ in 0..2 {
            match items.allocate_id() {
                Err(CartError::InvalidValue { field, value }) => {
                    assert_eq!(field, "item:id");
                    assert!(value.starts_with('-'));
                }
                other => panic!("expected corrupt counter error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_read_missing_is_empty() {
        let store = MemoryStore::new();
        let items = LineItemStore::new(&store);
        assert!(items.read(LineItemId::new(99)).unwrap().is_empty());
    }

    #[test]
    fn test_delete_removes_record() {
        let store = MemoryStore::new();
        let items = LineItemStore::new(&store);
        let id = LineItemId::new(1);
        store.hset("item:1", vec![("id".into(), "1".into())]).unwrap();

        let mut batch = Batch::new();
        items.delete(&mut batch, id);
        store.exec(batch).unwrap();
        assert!(!store.exists("item:1").unwrap());
    }
}
