//! Identifiers for carts, line items and products.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a cart's owner (a user id, a session id, a guest token).
///
/// Opaque to the cart: it only needs to print into store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    /// Create an owner ID from anything printable.
    pub fn new(id: impl fmt::Display) -> Self {
        Self(id.to_string())
    }

    /// Generate an anonymous owner ID for a guest cart.
    ///
    /// Guest carts are typically moved to the real user with
    /// [`Cart::reassign`](crate::Cart::reassign) after sign-in.
    pub fn guest() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("guest_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Whether this ID was produced by [`OwnerId::guest`].
    pub fn is_guest(&self) -> bool {
        self.0.starts_with("guest_")
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for OwnerId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// Globally unique line item identifier, allocated by the store counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineItemId(u64);

impl LineItemId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LineItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for LineItemId {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

/// Something that can be put in a cart: identified by a product type and a
/// product id.
///
/// Implement this for catalog types to use them with
/// [`Cart::contains`](crate::Cart::contains) and [`Cart::find`](crate::Cart::find).
pub trait Product {
    /// Product type, e.g. `"Bottle"`. Compared case-sensitively by the index.
    fn product_type(&self) -> &str;

    /// Product id as printed into index tokens.
    fn product_id(&self) -> String;
}

/// A bare (type, id) product reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRef {
    pub product_type: String,
    pub product_id: String,
}

impl ProductRef {
    pub fn new(product_type: impl Into<String>, product_id: impl fmt::Display) -> Self {
        Self {
            product_type: product_type.into(),
            product_id: product_id.to_string(),
        }
    }
}

impl Product for ProductRef {
    fn product_type(&self) -> &str {
        &self.product_type
    }

    fn product_id(&self) -> String {
        self.product_id.clone()
    }
}

impl<T: Product + ?Sized> Product for &T {
    fn product_type(&self) -> &str {
        (**self).product_type()
    }

    fn product_id(&self) -> String {
        (**self).product_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_id_from_number() {
        assert_eq!(OwnerId::from(42u64).as_str(), "42");
        assert_eq!(OwnerId::new(7).to_string(), "7");
    }

    #[test]
    fn test_guest_id_format() {
        let id = OwnerId::guest();
        assert!(id.is_guest());
        // 18 bytes of base64 = 24 chars, plus "guest_"
        assert_eq!(id.as_str().len(), 30);
        assert_ne!(OwnerId::guest(), OwnerId::guest());
        assert!(!OwnerId::from("user-1").is_guest());
    }

    #[test]
    fn test_line_item_id_parse() {
        assert_eq!("17".parse::<LineItemId>().unwrap(), LineItemId::new(17));
        assert!("abc".parse::<LineItemId>().is_err());
        assert_eq!(LineItemId::new(3).to_string(), "3");
    }

    #[test]
    fn test_product_ref() {
        let bottle = ProductRef::new("Bottle", 17);
        assert_eq!(bottle.product_type(), "Bottle");
        assert_eq!(bottle.product_id(), "17");
        assert_eq!((&bottle).product_id(), "17");
    }
}
