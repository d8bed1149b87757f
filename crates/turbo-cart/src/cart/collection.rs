//! Read-only view over loaded items.

use crate::cart::Item;
use crate::error::{CartError, Result};
use rust_decimal::Decimal;

/// Items returned by a cart query, in the order the store listed them.
#[derive(Clone, Debug, Default)]
pub struct ItemCollection {
    items: Vec<Item>,
}

impl ItemCollection {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&Item> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Item> {
        self.items.last()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Items whose type equals `product_type` exactly.
    pub fn of_type(&self, product_type: &str) -> ItemCollection {
        ItemCollection::new(
            self.items
                .iter()
                .filter(|item| item.product_type() == product_type)
                .cloned()
                .collect(),
        )
    }

    /// Sum of item quantities, clamped to the `i64` range.
    pub fn quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |sum, item| sum.saturating_add(item.quantity()))
    }

    /// Sum of item costs.
    pub fn total(&self) -> Result<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |sum, item| {
            sum.checked_add(item.cost()?).ok_or(CartError::Overflow)
        })
    }

    pub fn into_vec(self) -> Vec<Item> {
        self.items
    }
}

impl IntoIterator for ItemCollection {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ItemCollection {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
