//! Line item handle.

use crate::cart::Cart;
use crate::context::CartContext;
use crate::error::{CartError, Result};
use crate::fields::{self, FieldMap};
use crate::ids::{LineItemId, OwnerId, Product};
use crate::keys;
use crate::line_item::LineItemStore;
use rust_decimal::Decimal;
use std::fmt;

/// One line item, as loaded from the store.
///
/// Getters read the snapshot taken at load time. Setters write through to the
/// store, bump the item version, then touch the owning cart, so every item
/// change also shows up as a cart version bump.
#[derive(Clone, Debug)]
pub struct Item {
    ctx: CartContext,
    owner: OwnerId,
    line_item_id: LineItemId,
    fields: FieldMap,
    version: i64,
}

impl Item {
    pub(crate) fn from_parts(
        ctx: CartContext,
        owner: OwnerId,
        line_item_id: LineItemId,
        fields: FieldMap,
        version: i64,
    ) -> Self {
        Self {
            ctx,
            owner,
            line_item_id,
            fields,
            version,
        }
    }

    /// Load an item record; `None` when it does not exist.
    pub(crate) fn load(ctx: CartContext, owner: OwnerId, id: LineItemId) -> Result<Option<Self>> {
        let mut fields = LineItemStore::new(ctx.store()).read(id)?;
        if fields.is_empty() {
            return Ok(None);
        }
        let version = match fields.remove(keys::ITEM_VERSION_FIELD) {
            None => 0,
            Some(raw) => raw.parse::<i64>().map_err(|_| CartError::InvalidValue {
                field: format!("{}.{}", keys::item(id), keys::ITEM_VERSION_FIELD),
                value: raw,
            })?,
        };
        Ok(Some(Self::from_parts(ctx, owner, id, fields, version)))
    }

    /// Store-allocated line item id.
    pub fn line_item_id(&self) -> LineItemId {
        self.line_item_id
    }

    /// Item version, bumped on every mutation.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Owner of the cart this item was loaded from.
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn product_id(&self) -> &str {
        self.fields.product_id().unwrap_or_default()
    }

    pub fn product_type(&self) -> &str {
        self.fields.product_type().unwrap_or_default()
    }

    /// Any field from the snapshot.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    /// Every field from the snapshot, without the internal version.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Value of the configured quantity field.
    pub fn quantity(&self) -> i64 {
        self.fields.integer(&self.ctx.config().quantity_field)
    }

    /// Value of the configured unit cost field.
    pub fn unit_cost(&self) -> Decimal {
        self.fields.decimal(&self.ctx.config().unit_cost_field)
    }

    /// `unit_cost * quantity`, exact. Never stored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] when the product leaves the decimal range.
    pub fn cost(&self) -> Result<Decimal> {
        self.unit_cost()
            .checked_mul(Decimal::from(self.quantity()))
            .ok_or(CartError::Overflow)
    }

    pub fn coupon_id(&self) -> Option<&str> {
        self.fields.coupon_id()
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.fields.coupon_code()
    }

    pub fn discount(&self) -> Option<&str> {
        self.fields.discount()
    }

    /// Cart this item belongs to.
    pub fn cart(&self) -> Cart {
        Cart::new(self.ctx.clone(), self.owner.clone())
    }

    /// Write a field through to the store.
    ///
    /// `id`, `type` and the internal version field cannot be changed: the
    /// cart index is keyed by them.
    pub fn set(&mut self, name: &str, value: impl fmt::Display) -> Result<()> {
        Self::check_mutable(name)?;
        let value = value.to_string();
        self.version = LineItemStore::new(self.ctx.store()).set_field(
            self.line_item_id,
            name,
            &value,
        )?;
        self.fields.set(name, value);
        self.cart().touch()?;
        Ok(())
    }

    /// Remove a field from the store record.
    pub fn clear(&mut self, name: &str) -> Result<()> {
        Self::check_mutable(name)?;
        self.version =
            LineItemStore::new(self.ctx.store()).clear_field(self.line_item_id, name)?;
        self.fields.remove(name);
        self.cart().touch()?;
        Ok(())
    }

    fn check_mutable(name: &str) -> Result<()> {
        if name == fields::ID || name == fields::TYPE || name == keys::ITEM_VERSION_FIELD {
            return Err(CartError::Validation(format!(
                "Field {} cannot be changed",
                name
            )));
        }
        Ok(())
    }

    /// Set the configured quantity field.
    pub fn set_quantity(&mut self, quantity: i64) -> Result<()> {
        let field = self.ctx.config().quantity_field.clone();
        self.set(&field, quantity)
    }

    /// Set the configured unit cost field.
    pub fn set_unit_cost(&mut self, unit_cost: Decimal) -> Result<()> {
        let field = self.ctx.config().unit_cost_field.clone();
        self.set(&field, unit_cost)
    }

    pub fn set_coupon_id(&mut self, coupon_id: &str) -> Result<()> {
        self.set(fields::COUPON_ID, coupon_id)
    }

    pub fn set_coupon_code(&mut self, coupon_code: &str) -> Result<()> {
        self.set(fields::COUPON_CODE, coupon_code)
    }

    pub fn set_discount(&mut self, discount: impl fmt::Display) -> Result<()> {
        self.set(fields::DISCOUNT, discount)
    }

    /// Record a change without editing any field: bumps the item version and
    /// touches the cart.
    pub fn touch(&mut self) -> Result<()> {
        self.version = LineItemStore::new(self.ctx.store()).bump_version(self.line_item_id)?;
        self.cart().touch()?;
        Ok(())
    }

    /// Remove this item from its cart.
    pub fn destroy(self) -> Result<()> {
        self.cart().remove_item(&self)
    }

    /// Token that changes whenever the item is modified.
    pub fn cache_key(&self) -> String {
        format!("item/{}-{}", self.line_item_id, self.version)
    }
}

impl Product for Item {
    fn product_type(&self) -> &str {
        Item::product_type(self)
    }

    fn product_id(&self) -> String {
        Item::product_id(self).to_string()
    }
}
