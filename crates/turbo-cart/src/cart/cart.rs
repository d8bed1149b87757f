//! Cart aggregate.

use crate::cart::{Item, ItemCollection};
use crate::context::CartContext;
use crate::error::{CartError, Result};
use crate::fields::{self, leading_integer, FieldMap};
use crate::ids::{LineItemId, OwnerId, Product};
use crate::index::IndexStore;
use crate::keys;
use crate::line_item::LineItemStore;
use rust_decimal::Decimal;
use std::fmt;
use tracing::{debug, info, warn};
use turbo_kv::{Batch, KvStore, Ttl};

/// A shopping cart stored as separate keys in the store.
///
/// The cart owns a membership set of line item ids, a product index, a TTL
/// shared by all of its keys, and a version counter bumped by every
/// [`touch`](Cart::touch). A `Cart` is only a handle: creating one does no I/O
/// and two handles on the same owner see the same data.
#[derive(Clone, Debug)]
pub struct Cart {
    ctx: CartContext,
    owner: OwnerId,
}

impl Cart {
    pub(crate) fn new(ctx: CartContext, owner: OwnerId) -> Self {
        Self { ctx, owner }
    }

    /// Owner this handle is bound to.
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    fn store(&self) -> &dyn KvStore {
        self.ctx.store()
    }

    fn line_items(&self) -> LineItemStore<'_> {
        LineItemStore::new(self.ctx.store())
    }

    fn index(&self) -> IndexStore<'_> {
        IndexStore::new(self.ctx.store())
    }

    /// Add a line item.
    ///
    /// `fields` must contain `id` and `type`; a caller-supplied `_version` is
    /// ignored. The record, its membership entry and its index entries are
    /// written in one atomic batch, then the cart is touched.
    pub fn add_item(&self, mut fields: FieldMap) -> Result<Item> {
        let (product_id, product_type) = match (fields.product_id(), fields.product_type()) {
            (Some(id), Some(ty)) => (id.to_string(), ty.to_string()),
            _ => {
                return Err(CartError::Validation(
                    "Must specify both id and type".to_string(),
                ))
            }
        };
        fields.remove(keys::ITEM_VERSION_FIELD);

        let id = self.line_items().allocate_id()?;
        let mut batch = Batch::new();
        self.line_items().create(&mut batch, id, &fields);
        batch.sadd(keys::cart(&self.owner), id.to_string());
        self.index()
            .add(&mut batch, &self.owner, &product_type, &product_id, id);
        self.store().exec(batch)?;

        info!(
            owner = %self.owner,
            item_id = %id,
            product = %keys::index_token(&product_type, &product_id),
            "added line item"
        );

        self.touch()?;
        match self.get_item(id)? {
            Some(item) => Ok(item),
            None => Ok(Item::from_parts(
                self.ctx.clone(),
                self.owner.clone(),
                id,
                fields,
                1,
            )),
        }
    }

    /// Remove a line item and its index entries in one batch, then touch.
    pub fn remove_item(&self, item: &Item) -> Result<()> {
        let id = item.line_item_id();
        let mut batch = Batch::new();
        self.line_items().delete(&mut batch, id);
        batch.srem(keys::cart(&self.owner), id.to_string());
        self.index().remove(
            &mut batch,
            &self.owner,
            item.product_type(),
            item.product_id(),
        );
        self.store().exec(batch)?;

        info!(owner = %self.owner, item_id = %id, "removed line item");
        self.touch()?;
        Ok(())
    }

    /// All items in the cart, in store enumeration order.
    pub fn items(&self) -> Result<ItemCollection> {
        self.load_items(None)
    }

    /// Items whose `type` equals `product_type` exactly.
    pub fn items_of_type(&self, product_type: &str) -> Result<ItemCollection> {
        self.load_items(Some(product_type))
    }

    fn load_items(&self, product_type: Option<&str>) -> Result<ItemCollection> {
        let mut items = Vec::new();
        for id in self.member_ids()? {
            let Some(item) = self.get_item(id)? else {
                warn!(owner = %self.owner, item_id = %id, "skipping vanished line item");
                continue;
            };
            if product_type.map_or(true, |ty| item.product_type() == ty) {
                items.push(item);
            }
        }
        Ok(ItemCollection::new(items))
    }

    /// Whether the index holds `candidate`. Type compared case-sensitively.
    pub fn contains(&self, candidate: &impl Product) -> Result<bool> {
        self.index().contains(
            &self.owner,
            candidate.product_type(),
            &candidate.product_id(),
        )
    }

    /// Item for `candidate`, by index lookup. Type compared case-sensitively.
    pub fn find(&self, candidate: &impl Product) -> Result<Option<Item>> {
        match self.index().lookup(
            &self.owner,
            candidate.product_type(),
            &candidate.product_id(),
        )? {
            Some(id) => self.get_item(id),
            None => Ok(None),
        }
    }

    /// Item for a product, by scanning every item.
    ///
    /// Unlike [`find`](Cart::find) this matches ids numerically (`"017"` equals
    /// `17`) and types case-insensitively (`"bottle"` equals `"Bottle"`). The
    /// coupon operations locate items this way.
    pub fn find_item_by_product(
        &self,
        product_id: impl fmt::Display,
        product_type: &str,
    ) -> Result<Option<Item>> {
        let wanted_id = leading_integer(&product_id.to_string());
        let wanted_type = product_type.to_lowercase();
        Ok(self.items()?.into_iter().find(|item| {
            leading_integer(item.product_id()) == wanted_id
                && item.product_type().to_lowercase() == wanted_type
        }))
    }

    /// Attach a coupon to the item for a product.
    ///
    /// Returns false when no item matches or it already carries `coupon_id`.
    /// The three coupon fields are written one after another; a failure part
    /// way leaves the coupon partially applied.
    pub fn apply_coupon(
        &self,
        coupon_id: impl fmt::Display,
        coupon_code: &str,
        product_id: impl fmt::Display,
        product_type: &str,
        discount: impl fmt::Display,
    ) -> Result<bool> {
        let Some(mut item) = self.find_item_by_product(product_id, product_type)? else {
            return Ok(false);
        };
        let coupon_id = coupon_id.to_string();
        if item.coupon_id() == Some(coupon_id.as_str()) {
            return Ok(false);
        }
        item.set_coupon_id(&coupon_id)?;
        item.set_coupon_code(coupon_code)?;
        item.set_discount(discount)?;
        Ok(true)
    }

    /// Clear the coupon fields of the item for a product.
    pub fn remove_coupon(&self, product_id: impl fmt::Display, product_type: &str) -> Result<bool> {
        let Some(mut item) = self.find_item_by_product(product_id, product_type)? else {
            return Ok(false);
        };
        for field in fields::COUPON_FIELDS {
            item.clear(field)?;
        }
        Ok(true)
    }

    /// Whether any item carries a coupon.
    pub fn any_coupons(&self) -> Result<bool> {
        Ok(self.items()?.iter().any(|item| item.coupon_id().is_some()))
    }

    /// Number of line items.
    pub fn count(&self) -> Result<u64> {
        Ok(self.store().scard(&keys::cart(&self.owner))?)
    }

    /// Sum of the configured quantity field over all items, clamped to the
    /// `i64` range.
    pub fn quantity(&self) -> Result<i64> {
        let field = &self.ctx.config().quantity_field;
        let mut total = 0i64;
        for id in self.member_ids()? {
            if let Some(raw) = self.store().hget(&keys::item(id), field)? {
                total = total.saturating_add(leading_integer(&raw));
            }
        }
        Ok(total)
    }

    /// Sum of item costs, exact. Fails with [`CartError::Overflow`] rather
    /// than wrapping.
    pub fn total(&self) -> Result<Decimal> {
        self.items()?.total()
    }

    /// Remaining lifetime of the cart.
    pub fn ttl(&self) -> Result<Ttl> {
        Ok(self.store().ttl(&keys::cart(&self.owner))?)
    }

    /// Extend the life of every cart key and bump the cart version.
    ///
    /// Returns the new version.
    pub fn touch(&self) -> Result<i64> {
        let ttl = self.ctx.config().cart_expires_in;
        let mut batch = Batch::new();
        for id in self.member_ids()? {
            batch.expire(keys::item(id), ttl);
        }
        batch
            .expire(keys::cart(&self.owner), ttl)
            .expire(keys::discount(&self.owner), ttl);
        let detail_keys = self.index().all_detail_keys(&self.owner)?;
        if !detail_keys.is_empty() {
            batch.expire(keys::index(&self.owner), ttl);
            for key in detail_keys {
                batch.expire(key, ttl);
            }
        }
        let expired = batch.len();
        self.store().exec(batch)?;

        let version = self.store().hincrby(
            keys::VERSIONS,
            &keys::version_field(&self.owner),
            1,
        )?;
        debug!(owner = %self.owner, version, keys = expired, "touched cart");
        Ok(version)
    }

    /// Current cart version; 0 for a cart never touched.
    pub fn version(&self) -> Result<i64> {
        let field = keys::version_field(&self.owner);
        match self.store().hget(keys::VERSIONS, &field)? {
            None => Ok(0),
            Some(raw) => raw.parse::<i64>().map_err(|_| CartError::InvalidValue {
                field: format!("{}.{}", keys::VERSIONS, field),
                value: raw,
            }),
        }
    }

    /// Delete every key of the cart in one batch. The version is kept.
    pub fn destroy(&self) -> Result<()> {
        let mut batch = Batch::new();
        for id in self.member_ids()? {
            self.line_items().delete(&mut batch, id);
        }
        batch
            .del(keys::cart(&self.owner))
            .del(keys::index(&self.owner))
            .del(keys::discount(&self.owner));
        for key in self.index().all_detail_keys(&self.owner)? {
            batch.del(key);
        }
        self.store().exec(batch)?;

        info!(owner = %self.owner, "destroyed cart");
        Ok(())
    }

    /// Move this cart to another owner, e.g. a guest cart to the signed-in
    /// user.
    ///
    /// When the cart exists its membership set, index, the detail key of every
    /// indexed product, and discount code are renamed in one batch,
    /// overwriting anything the new owner had under those keys. Line item records are owner-free and stay
    /// put. The handle is rebound either way; items loaded earlier keep the
    /// old owner.
    pub fn reassign(&mut self, new_owner: impl Into<OwnerId>) -> Result<()> {
        let new_owner = new_owner.into();
        if new_owner == self.owner {
            return Ok(());
        }

        let old = &self.owner;
        if self.store().exists(&keys::cart(old))? {
            let tokens = self.index().tokens(old)?;

            let mut batch = Batch::new();
            batch.rename(keys::cart(old), keys::cart(&new_owner));
            if !tokens.is_empty() {
                batch.rename(keys::index(old), keys::index(&new_owner));
            }
            for token in &tokens {
                let from = keys::token_detail(old, token);
                if self.store().exists(&from)? {
                    batch.rename(from, keys::token_detail(&new_owner, token));
                }
            }
            if self.store().exists(&keys::discount(old))? {
                batch.rename(keys::discount(old), keys::discount(&new_owner));
            }
            debug!(from = %old, to = %new_owner, renames = batch.len(), "reassign plan");
            self.store().exec(batch)?;

            info!(from = %old, to = %new_owner, products = tokens.len(), "reassigned cart");
        }

        self.owner = new_owner;
        Ok(())
    }

    /// Token that changes whenever the cart is touched.
    pub fn cache_key(&self) -> Result<String> {
        Ok(format!("cart/{}-{}", self.owner, self.version()?))
    }

    /// Record a cart-level discount code and touch the cart.
    pub fn set_discount_code(&self, code: &str) -> Result<()> {
        self.store().set(&keys::discount(&self.owner), code)?;
        self.touch()?;
        Ok(())
    }

    /// Cart-level discount code, if one is set.
    pub fn discount_code(&self) -> Result<Option<String>> {
        Ok(self.store().get(&keys::discount(&self.owner))?)
    }

    fn member_ids(&self) -> Result<Vec<LineItemId>> {
        let key = keys::cart(&self.owner);
        self.store()
            .smembers(&key)?
            .into_iter()
            .map(|raw| {
                raw.parse::<LineItemId>().map_err(|_| CartError::InvalidValue {
                    field: key.clone(),
                    value: raw,
                })
            })
            .collect()
    }

    fn get_item(&self, id: LineItemId) -> Result<Option<Item>> {
        Item::load(self.ctx.clone(), self.owner.clone(), id)
    }
}
