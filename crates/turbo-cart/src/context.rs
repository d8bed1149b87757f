//! Shared store handle and configuration.

use crate::cart::Cart;
use crate::config::CartConfig;
use crate::error::Result;
use crate::ids::OwnerId;
use std::sync::Arc;
use turbo_kv::KvStore;

/// The store and settings every cart handle works against.
///
/// Cheap to clone; items keep a copy so they can touch their cart.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use turbo_cart::{CartConfig, CartContext, FieldMap};
/// use turbo_kv::MemoryStore;
///
/// let ctx = CartContext::new(Arc::new(MemoryStore::new()), CartConfig::default())?;
/// let cart = ctx.cart("user-1");
/// cart.add_item(FieldMap::new().with("id", 17).with("type", "Bottle"))?;
/// assert_eq!(cart.count()?, 1);
/// # Ok::<(), turbo_cart::CartError>(())
/// ```
#[derive(Clone)]
pub struct CartContext {
    store: Arc<dyn KvStore>,
    config: Arc<CartConfig>,
}

impl CartContext {
    /// Bind a store to a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Config`](crate::CartError::Config) when `config` fails
    /// [`CartConfig::validate`], e.g. a zero TTL that would make every
    /// `touch` delete the cart.
    pub fn new(store: Arc<dyn KvStore>, config: CartConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
        })
    }

    /// Open a handle on the cart owned by `owner`. No store access.
    pub fn cart(&self, owner: impl Into<OwnerId>) -> Cart {
        Cart::new(self.clone(), owner.into())
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }
}

impl std::fmt::Debug for CartContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CartError;
    use turbo_kv::MemoryStore;

    #[test]
    fn test_new_rejects_invalid_config() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        for config in [
            CartConfig::default().with_expires_in(0),
            CartConfig::default().with_quantity_field(""),
            CartConfig::default().with_unit_cost_field(""),
        ] {
            assert!(matches!(
                CartContext::new(store.clone(), config),
                Err(CartError::Config(_))
            ));
        }
    }

    #[test]
    fn test_new_accepts_defaults() {
        let ctx = CartContext::new(Arc::new(MemoryStore::new()), CartConfig::default()).unwrap();
        assert_eq!(ctx.config().cart_expires_in, 604_800);
        assert_eq!(ctx.cart("u").owner().as_str(), "u");
    }
}
