//! Per-cart product index.
//!
//! Two structures per cart: the token set `cart:<U>:index` for membership
//! tests, and one detail key per token holding the line item id.

use crate::error::{CartError, Result};
use crate::ids::{LineItemId, OwnerId};
use crate::keys;
use turbo_kv::{Batch, KvStore};

#[derive(Clone, Copy)]
pub struct IndexStore<'a> {
    store: &'a dyn KvStore,
}

impl<'a> IndexStore<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    /// Queue the token and its detail key.
    pub fn add(
        &self,
        batch: &mut Batch,
        owner: &OwnerId,
        product_type: &str,
        product_id: &str,
        item: LineItemId,
    ) {
        batch
            .sadd(keys::index(owner), keys::index_token(product_type, product_id))
            .set(
                keys::index_detail(owner, product_type, product_id),
                item.to_string(),
            );
    }

    /// Queue removal of the token and its detail key.
    pub fn remove(&self, batch: &mut Batch, owner: &OwnerId, product_type: &str, product_id: &str) {
        batch
            .srem(keys::index(owner), keys::index_token(product_type, product_id))
            .del(keys::index_detail(owner, product_type, product_id));
    }

    /// Exact, case-sensitive token membership.
    pub fn contains(&self, owner: &OwnerId, product_type: &str, product_id: &str) -> Result<bool> {
        Ok(self.store.sismember(
            &keys::index(owner),
            &keys::index_token(product_type, product_id),
        )?)
    }

    /// Line item id recorded for a product, if any.
    pub fn lookup(
        &self,
        owner: &OwnerId,
        product_type: &str,
        product_id: &str,
    ) -> Result<Option<LineItemId>> {
        let key = keys::index_detail(owner, product_type, product_id);
        match self.store.get(&key)? {
            None => Ok(None),
            Some(raw) => raw
                .parse::<LineItemId>()
                .map(Some)
                .map_err(|_| CartError::InvalidValue {
                    field: key,
                    value: raw,
                }),
        }
    }

    /// Whether the token set exists at all.
    pub fn exists(&self, owner: &OwnerId) -> Result<bool> {
        Ok(self.store.exists(&keys::index(owner))?)
    }

    /// Every token in the cart's token set.
    pub fn tokens(&self, owner: &OwnerId) -> Result<Vec<String>> {
        Ok(self.store.smembers(&keys::index(owner))?)
    }

    /// Detail keys of every token in the cart's token set.
    ///
    /// Derived from the token set rather than a key scan, so an owner id
    /// holding glob characters never reaches another cart's keys.
    pub fn all_detail_keys(&self, owner: &OwnerId) -> Result<Vec<String>> {
        Ok(self
            .tokens(owner)?
            .iter()
            .map(|token| keys::token_detail(owner, token))
            .collect())
    }
}
