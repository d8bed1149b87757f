//! Store key layout.
//!
//! ```text
//! cart:<U>                     set of item ids
//! cart:<U>:index               set of "<T>:<P>" tokens
//! cart:<U>:index:<T>:<P>       string -> item id
//! cart:<U>:discounted          string, cart-level discount code
//! item:<I>                     field-map (includes _version)
//! item:id                      global integer counter
//! cart:versions                map: <U> -> integer version
//! ```
//!
//! Line item keys carry no owner: ownership lives only in the cart's
//! membership set.

use crate::ids::{LineItemId, OwnerId};

/// Global line item id counter.
pub const ITEM_ID_COUNTER: &str = "item:id";

/// Map of owner id to cart version. Never expired.
pub const VERSIONS: &str = "cart:versions";

/// Field holding an item's own version inside its record.
pub const ITEM_VERSION_FIELD: &str = "_version";

/// Cart membership set.
pub fn cart(owner: &OwnerId) -> String {
    format!("cart:{}", owner)
}

/// Index token set.
pub fn index(owner: &OwnerId) -> String {
    format!("{}:index", cart(owner))
}

/// Index detail key for one product.
pub fn index_detail(owner: &OwnerId, product_type: &str, product_id: &str) -> String {
    token_detail(owner, &index_token(product_type, product_id))
}

/// Index detail key for a token already in `<type>:<id>` form.
pub fn token_detail(owner: &OwnerId, token: &str) -> String {
    format!("{}:{}", index(owner), token)
}

/// Member of the index token set.
pub fn index_token(product_type: &str, product_id: &str) -> String {
    format!("{}:{}", product_type, product_id)
}

/// Cart-level discount code.
pub fn discount(owner: &OwnerId) -> String {
    format!("{}:discounted", cart(owner))
}

/// Line item record.
pub fn item(id: LineItemId) -> String {
    format!("item:{}", id)
}

/// Field of [`VERSIONS`] holding a cart's version.
pub fn version_field(owner: &OwnerId) -> String {
    owner.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        let u = OwnerId::from("1");
        assert_eq!(cart(&u), "cart:1");
        assert_eq!(index(&u), "cart:1:index");
        assert_eq!(index_detail(&u, "Bottle", "17"), "cart:1:index:Bottle:17");
        assert_eq!(token_detail(&u, "Bottle:17"), index_detail(&u, "Bottle", "17"));
        assert_eq!(index_token("Bottle", "17"), "Bottle:17");
        assert_eq!(discount(&u), "cart:1:discounted");
        assert_eq!(item(LineItemId::new(9)), "item:9");
        assert_eq!(version_field(&u), "1");
    }

    #[test]
    fn test_item_keys_do_not_collide_with_counter() {
        assert_ne!(item(LineItemId::new(0)), ITEM_ID_COUNTER);
    }
}
