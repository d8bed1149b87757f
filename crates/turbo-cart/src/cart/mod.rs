//! Shopping cart module.
//!
//! Contains the cart aggregate, line item handles and item collections.

mod cart;
mod collection;
mod item;

pub use cart::Cart;
pub use collection::ItemCollection;
pub use item::Item;
