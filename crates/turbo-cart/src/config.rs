//! Cart configuration.

use crate::error::{CartError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cart lifetime: one week.
pub const DEFAULT_CART_EXPIRES_IN: u64 = 604_800;

/// Settings shared by every cart handle.
///
/// ```toml
/// cart_expires_in = 3600
/// quantity_field = "qty"
/// unit_cost_field = "unit_cost_in_cents"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    /// Seconds a cart and its items live after their last touch.
    #[serde(default = "default_cart_expires_in")]
    pub cart_expires_in: u64,

    /// Item field summed by [`Cart::quantity`](crate::Cart::quantity).
    #[serde(default = "default_quantity_field")]
    pub quantity_field: String,

    /// Item field multiplied by quantity to get an item's cost.
    #[serde(default = "default_unit_cost_field")]
    pub unit_cost_field: String,
}

fn default_cart_expires_in() -> u64 {
    DEFAULT_CART_EXPIRES_IN
}

fn default_quantity_field() -> String {
    "quantity".to_string()
}

fn default_unit_cost_field() -> String {
    "unit_cost".to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            cart_expires_in: default_cart_expires_in(),
            quantity_field: default_quantity_field(),
            unit_cost_field: default_unit_cost_field(),
        }
    }
}

impl CartConfig {
    /// Load config from a file.
    ///
    /// Files ending in `.json` are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CartError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: CartConfig = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the cart lifetime in seconds.
    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.cart_expires_in = seconds;
        self
    }

    /// Set the item field holding quantities.
    pub fn with_quantity_field(mut self, field: impl Into<String>) -> Self {
        self.quantity_field = field.into();
        self
    }

    /// Set the item field holding unit costs.
    pub fn with_unit_cost_field(mut self, field: impl Into<String>) -> Self {
        self.unit_cost_field = field.into();
        self
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.cart_expires_in == 0 {
            return Err(CartError::Config(
                "cart_expires_in must be greater than zero".to_string(),
            ));
        }
        if self.quantity_field.is_empty() {
            return Err(CartError::Config("quantity_field must not be empty".to_string()));
        }
        if self.unit_cost_field.is_empty() {
            return Err(CartError::Config(
                "unit_cost_field must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CartConfig::default();
        assert_eq!(config.cart_expires_in, 604_800);
        assert_eq!(config.quantity_field, "quantity");
        assert_eq!(config.unit_cost_field, "unit_cost");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CartConfig = toml::from_str("quantity_field = \"qty\"").unwrap();
        assert_eq!(config.quantity_field, "qty");
        assert_eq!(config.cart_expires_in, DEFAULT_CART_EXPIRES_IN);
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "cart_expires_in = 3600").unwrap();
        writeln!(file, "unit_cost_field = \"unit_cost_in_cents\"").unwrap();

        let config = CartConfig::load(file.path()).unwrap();
        assert_eq!(config.cart_expires_in, 3600);
        assert_eq!(config.unit_cost_field, "unit_cost_in_cents");
        assert_eq!(config.quantity_field, "quantity");
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"cart_expires_in": 120, "quantity_field": "qty"}}"#).unwrap();

        let config = CartConfig::load(file.path()).unwrap();
        assert_eq!(config.cart_expires_in, 120);
        assert_eq!(config.quantity_field, "qty");
    }

    #[test]
    fn test_load_rejects_zero_ttl() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "cart_expires_in = 0").unwrap();
        assert!(matches!(
            CartConfig::load(file.path()),
            Err(CartError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = CartConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_builders() {
        let config = CartConfig::default()
            .with_expires_in(10)
            .with_quantity_field("qty")
            .with_unit_cost_field("");
        assert_eq!(config.cart_expires_in, 10);
        assert!(config.validate().is_err());
    }
}
