//! Key-Value backed shopping carts for TurboCommerce.
//!
//! A cart is not one record but a handful of keys kept consistent with
//! atomic batches:
//!
//! - **Membership**: a set of line item ids per owner
//! - **Index**: product tokens and per-product detail keys for O(1) lookup
//! - **Line items**: one field map per item, in a global namespace
//! - **Versions**: a global map of owner to cart version, for cache keys
//!
//! Every key a cart owns shares its TTL, which [`Cart::touch`] extends.
//! The store itself is abstracted by [`turbo_kv::KvStore`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use turbo_cart::prelude::*;
//! use turbo_kv::MemoryStore;
//!
//! let ctx = CartContext::new(Arc::new(MemoryStore::new()), CartConfig::default())?;
//! let cart = ctx.cart(OwnerId::guest());
//!
//! cart.add_item(
//!     FieldMap::new()
//!         .with("id", 17)
//!         .with("type", "Bottle")
//!         .with("unit_cost", "92.12")
//!         .with("quantity", 2),
//! )?;
//!
//! assert!(cart.contains(&ProductRef::new("Bottle", 17))?);
//! assert_eq!(cart.total()?.to_string(), "184.24");
//!
//! // Signed in: move the guest cart to the user.
//! let mut cart = cart;
//! cart.reassign("user-42")?;
//! assert_eq!(ctx.cart("user-42").quantity()?, 2);
//! # Ok::<(), turbo_cart::CartError>(())
//! ```

pub mod cart;
pub mod config;
pub mod context;
pub mod error;
pub mod fields;
pub mod ids;
pub mod index;
pub mod keys;
pub mod line_item;

pub use cart::{Cart, Item, ItemCollection};
pub use config::CartConfig;
pub use context::CartContext;
pub use error::CartError;
pub use fields::FieldMap;
pub use ids::{LineItemId, OwnerId, Product, ProductRef};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cart::{Cart, Item, ItemCollection};
    pub use crate::config::CartConfig;
    pub use crate::context::CartContext;
    pub use crate::error::CartError;
    pub use crate::fields::FieldMap;
    pub use crate::ids::{LineItemId, OwnerId, Product, ProductRef};
}
