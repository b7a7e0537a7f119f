use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// A product listed in the store.
///
/// Products are identified by the `(vendor, name)` pair. A freshly released
/// product is owned by its vendor and unbought; the only mutation a product
/// ever sees is a purchase, which changes the owner and sets `bought`.
///
/// `Product` is a value type: the transition methods consume `self` and
/// return the updated record instead of mutating in place.
///
/// The stored encoding is a JSON object with the fields `vendor`, `name`,
/// `price`, `owner` (all strings) and `bought` (a boolean). When decoding,
/// `bought` follows [`is_truthy`], and a missing `bought` field is `false`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Product {
    vendor: String,
    name: String,
    price: String,
    owner: String,
    #[serde(default, deserialize_with = "deserialize_bought")]
    bought: bool,
}

impl Product {
    pub fn new(
        vendor: impl Into<String>,
        name: impl Into<String>,
        price: impl Into<String>,
        owner: impl Into<String>,
        bought: bool,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            name: name.into(),
            price: price.into(),
            owner: owner.into(),
            bought,
        }
    }

    /// A new, unbought listing owned by its vendor.
    pub fn listing(
        vendor: impl Into<String>,
        name: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        let vendor = vendor.into();
        let owner = vendor.clone();
        Self::new(vendor, name, price, owner, false)
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The price exactly as it was released. No arithmetic is performed on it.
    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_bought(&self) -> bool {
        self.bought
    }

    /// Return this product with a different owner.
    pub fn with_owner(self, owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..self
        }
    }

    /// Return this product with `bought` set. The flag is never cleared.
    pub fn mark_bought(self) -> Self {
        Self {
            bought: true,
            ..self
        }
    }

    /// Encode to the stored JSON representation.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode from the stored JSON representation.
    pub fn from_json_bytes(data: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(data).map_err(|e| TypeError::Deserialization(e.to_string()))
    }
}

impl fmt::Debug for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product({}/{} price={} owner={} bought={})",
            self.vendor, self.name, self.price, self.owner, self.bought
        )
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vendor, self.name)
    }
}

/// The `bought` truthiness rule.
///
/// Only a JSON `true` or the exact string `"true"` count as bought. Every
/// other value, including `"TRUE"`, `1` and `null`, is `false`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => is_truthy_str(s),
        _ => false,
    }
}

/// [`is_truthy`] for plain-text arguments.
pub fn is_truthy_str(value: &str) -> bool {
    value == "true"
}

fn deserialize_bought<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn airpods() -> Product {
        Product::new("apple", "airpods", "1000", "apple", false)
    }

    #[test]
    fn listing_is_owned_by_vendor_and_unbought() {
        let p = Product::listing("apple", "airpods", "1000");
        assert_eq!(p, airpods());
        assert_eq!(p.owner(), p.vendor());
        assert!(!p.is_bought());
    }

    #[test]
    fn transitions_return_new_values() {
        let original = airpods();
        let bought = original.clone().with_owner("alice").mark_bought();

        assert_eq!(original.owner(), "apple");
        assert!(!original.is_bought());
        assert_eq!(bought.owner(), "alice");
        assert!(bought.is_bought());
        assert_eq!(bought.vendor(), "apple");
        assert_eq!(bought.price(), "1000");
    }

    #[test]
    fn mark_bought_is_idempotent() {
        let p = airpods().mark_bought().mark_bought();
        assert!(p.is_bought());
    }

    #[test]
    fn encodes_expected_field_layout() {
        let bytes = airpods().to_json_bytes().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!({
                "vendor": "apple",
                "name": "airpods",
                "price": "1000",
                "owner": "apple",
                "bought": false,
            })
        );
    }

    #[test]
    fn decode_normalizes_bought() {
        let cases = [
            (json!(true), true),
            (json!("true"), true),
            (json!(false), false),
            (json!("false"), false),
            (json!("TRUE"), false),
            (json!("yes"), false),
            (json!(1), false),
            (Value::Null, false),
        ];
        for (bought, expected) in cases {
            let doc = json!({
                "vendor": "v",
                "name": "n",
                "price": "1",
                "owner": "v",
                "bought": bought,
            });
            let p = Product::from_json_bytes(doc.to_string().as_bytes()).unwrap();
            assert_eq!(p.is_bought(), expected, "bought = {bought}");
        }
    }

    #[test]
    fn missing_bought_decodes_as_false() {
        let doc = br#"{"vendor":"v","name":"n","price":"1","owner":"v"}"#;
        let p = Product::from_json_bytes(doc).unwrap();
        assert!(!p.is_bought());
    }

    #[test]
    fn field_order_is_irrelevant() {
        let doc = br#"{"bought":true,"owner":"bob","price":"9","name":"n","vendor":"v"}"#;
        let p = Product::from_json_bytes(doc).unwrap();
        assert_eq!(p, Product::new("v", "n", "9", "bob", true));
    }

    #[test]
    fn malformed_records_are_rejected() {
        assert!(matches!(
            Product::from_json_bytes(b"not json"),
            Err(TypeError::Deserialization(_))
        ));
        assert!(matches!(
            Product::from_json_bytes(br#"{"vendor":"v","name":"n"}"#),
            Err(TypeError::Deserialization(_))
        ));
        assert!(matches!(
            Product::from_json_bytes(br#"{"vendor":"v","name":"n","price":1000,"owner":"v"}"#),
            Err(TypeError::Deserialization(_))
        ));
    }

    #[test]
    fn truthy_str_is_exact() {
        assert!(is_truthy_str("true"));
        assert!(!is_truthy_str("True"));
        assert!(!is_truthy_str(" true"));
        assert!(!is_truthy_str(""));
    }

    #[test]
    fn display_and_debug() {
        let p = airpods();
        assert_eq!(p.to_string(), "apple/airpods");
        assert!(format!("{p:?}").contains("bought=false"));
    }

    proptest! {
        #[test]
        fn stored_encoding_roundtrips(
            vendor in ".*",
            name in ".*",
            price in "[0-9]{1,6}(\\.[0-9]{2})?",
            owner in ".*",
            bought in any::<bool>(),
        ) {
            let p = Product::new(vendor, name, price, owner, bought);
            let decoded = Product::from_json_bytes(&p.to_json_bytes().unwrap()).unwrap();
            prop_assert_eq!(decoded, p);
        }
    }
}
