//! Line item field maps.
//!
//! Items are stored as flat string maps. [`FieldMap`] keeps that shape but
//! puts typed accessors in front of the fields the cart itself understands.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const ID: &str = "id";
pub const TYPE: &str = "type";
pub const COUPON_ID: &str = "coupon_id";
pub const COUPON_CODE: &str = "coupon_code";
pub const DISCOUNT: &str = "discount";

/// Coupon fields, in the order they are written.
pub const COUPON_FIELDS: [&str; 3] = [COUPON_ID, COUPON_CODE, DISCOUNT];

/// Named string attributes of a line item.
///
/// # Example
///
/// ```rust
/// use turbo_cart::FieldMap;
///
/// let fields = FieldMap::new()
///     .with("id", 17)
///     .with("type", "Bottle")
///     .with("unit_cost", "92.12")
///     .with("quantity", 2);
/// assert_eq!(fields.product_type(), Some("Bottle"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl fmt::Display) {
        self.0.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Product id.
    pub fn product_id(&self) -> Option<&str> {
        self.get(ID)
    }

    /// Product type.
    pub fn product_type(&self) -> Option<&str> {
        self.get(TYPE)
    }

    /// Integer value of `field`; missing or unparseable reads as zero.
    pub fn integer(&self, field: &str) -> i64 {
        self.get(field).map_or(0, leading_integer)
    }

    /// Exact decimal value of `field`; missing or unparseable reads as zero.
    pub fn decimal(&self, field: &str) -> Decimal {
        self.get(field)
            .and_then(|raw| Decimal::from_str(raw.trim()).ok())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn coupon_id(&self) -> Option<&str> {
        self.get(COUPON_ID).filter(|v| !v.is_empty())
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.get(COUPON_CODE).filter(|v| !v.is_empty())
    }

    pub fn discount(&self) -> Option<&str> {
        self.get(DISCOUNT).filter(|v| !v.is_empty())
    }

    /// Pairs ready for a store write.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl From<Vec<(String, String)>> for FieldMap {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs.into_iter().collect())
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        )
    }
}

/// Parse the leading integer of `raw`, ignoring leading whitespace and any
/// trailing garbage. `"2"`, `"2.5"` and `"2 bottles"` all read as 2; text
/// with no leading digits reads as 0. Digit runs beyond the `i64` range clamp
/// to `i64::MAX` or `i64::MIN`.
pub fn leading_integer(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |n, b| {
            let digit = i64::from(b - b'0');
            if negative {
                n.saturating_mul(10).saturating_sub(digit)
            } else {
                n.saturating_mul(10).saturating_add(digit)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_stringifies_values() {
        let fields = FieldMap::new().with("id", 17).with("unit_cost", 92.12);
        assert_eq!(fields.product_id(), Some("17"));
        assert_eq!(fields.get("unit_cost"), Some("92.12"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_decimal_is_exact() {
        let fields = FieldMap::new().with("unit_cost", "92.12");
        assert_eq!(fields.decimal("unit_cost"), dec!(92.12));
        assert_eq!(fields.decimal("missing"), Decimal::ZERO);
        assert_eq!(
            FieldMap::new().with("c", "abc").decimal("c"),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("2"), 2);
        assert_eq!(leading_integer(" 12abc"), 12);
        assert_eq!(leading_integer("2.9"), 2);
        assert_eq!(leading_integer("-3"), -3);
        assert_eq!(leading_integer("abc"), 0);
        assert_eq!(leading_integer(""), 0);
    }

    #[test]
    fn test_leading_integer_clamps_out_of_range() {
        assert_eq!(leading_integer("9223372036854775807"), i64::MAX);
        assert_eq!(leading_integer("99999999999999999999 bottles"), i64::MAX);
        assert_eq!(leading_integer("-9223372036854775808"), i64::MIN);
        assert_eq!(leading_integer("-99999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_empty_coupon_reads_as_none() {
        let fields = FieldMap::new().with(COUPON_ID, "").with(COUPON_CODE, "SAVE");
        assert_eq!(fields.coupon_id(), None);
        assert_eq!(fields.coupon_code(), Some("SAVE"));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let fields = FieldMap::new().with("id", 1).with("type", "Bottle");
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"id":"1","type":"Bottle"}"#);
    }
}
