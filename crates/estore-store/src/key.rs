//! Composite key encoding.
//!
//! A composite key scopes a record under a namespace tag (its object type)
//! followed by the attributes that identify it. The layout is
//!
//! ```text
//! \0 <object type> \0 <attr 1> \0 <attr 2> \0 ...
//! ```
//!
//! Every component is terminated by the separator, so the encoding is
//! injective over attribute lists and a key built from a leading subset of
//! attributes is a byte prefix of every key that extends it. That is what
//! makes namespace and vendor scans plain prefix scans.
//!
//! Components must not contain the separator (`U+0000`) or the reserved
//! maximum code point (`U+10FFFF`), which range scans use as an upper bound.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// Separator between key components.
pub const SEPARATOR: char = '\u{0}';

/// Reserved code point; never valid inside a component.
pub const MAX_CODE_POINT: char = '\u{10FFFF}';

/// Namespace tag for product records.
pub const PRODUCT_NAMESPACE: &str = "PROD";

/// An encoded composite key.
///
/// Deserialization goes through [`CompositeKey::from_encoded`], so a key read
/// back from disk has the same layout guarantees as one built with
/// [`CompositeKey::new`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Build a key from an object type and its attributes.
    ///
    /// Passing fewer attributes than a full key carries yields a partial key,
    /// suitable as a scan prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use estore_store::CompositeKey;
    ///
    /// let full = CompositeKey::new("PROD", ["apple", "airpods"]).unwrap();
    /// let all = CompositeKey::new("PROD", Vec::<&str>::new()).unwrap();
    /// assert!(full.starts_with(&all));
    /// assert!(CompositeKey::new("PROD", ["bad\0vendor"]).is_err());
    /// ```
    pub fn new<I, S>(object_type: &str, attributes: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if object_type.is_empty() {
            return Err(KeyError::EmptyObjectType);
        }
        validate_component(object_type)?;

        let mut key = String::with_capacity(object_type.len() + 2);
        key.push(SEPARATOR);
        key.push_str(object_type);
        key.push(SEPARATOR);
        for attribute in attributes {
            let attribute = attribute.as_ref();
            validate_component(attribute)?;
            key.push_str(attribute);
            key.push(SEPARATOR);
        }
        Ok(Self(key))
    }

    /// Parse an already-encoded key, checking its layout.
    pub fn from_encoded(encoded: impl Into<String>) -> Result<Self, KeyError> {
        let key = Self(encoded.into());
        key.split()?;
        Ok(key)
    }

    /// Split the key back into its object type and attributes.
    pub fn split(&self) -> Result<(String, Vec<String>), KeyError> {
        let body = self
            .0
            .strip_prefix(SEPARATOR)
            .and_then(|rest| rest.strip_suffix(SEPARATOR))
            .ok_or_else(|| KeyError::Malformed(self.to_string()))?;

        let mut components = body.split(SEPARATOR).map(str::to_string);
        let object_type = components
            .next()
            .filter(|t| !t.is_empty())
            .ok_or(KeyError::EmptyObjectType)?;
        Ok((object_type, components.collect()))
    }

    /// Whether `prefix` is a byte prefix of this key.
    pub fn starts_with(&self, prefix: &CompositeKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for CompositeKey {
    type Error = KeyError;

    fn try_from(encoded: String) -> Result<Self, KeyError> {
        Self::from_encoded(encoded)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in self.0.chars() {
            if ch == SEPARATOR {
                f.write_str("\\u0000")?;
            } else {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompositeKey({self})")
    }
}

/// Key of the product released by `vendor` under `name`.
pub fn product_key(vendor: &str, name: &str) -> Result<CompositeKey, KeyError> {
    CompositeKey::new(PRODUCT_NAMESPACE, [vendor, name])
}

/// Prefix shared by every product key.
pub fn products_prefix() -> CompositeKey {
    CompositeKey(format!("{SEPARATOR}{PRODUCT_NAMESPACE}{SEPARATOR}"))
}

/// Prefix shared by every product of one vendor.
pub fn vendor_prefix(vendor: &str) -> Result<CompositeKey, KeyError> {
    CompositeKey::new(PRODUCT_NAMESPACE, [vendor])
}

fn validate_component(component: &str) -> Result<(), KeyError> {
    match component
        .chars()
        .find(|&ch| ch == SEPARATOR || ch == MAX_CODE_POINT)
    {
        Some(ch) => Err(KeyError::InvalidCharacter {
            component: component.to_string(),
            ch,
        }),
        None => Ok(()),
    }
}
