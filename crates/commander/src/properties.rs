//! Read-only key/value properties published for inspection tooling.
//!
//! Nothing in-process reads these back.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Codec vendor id.
pub const CODEC_VENDOR_ID: &str = "IOHDACodecVendorID";
/// Codec address on the link.
pub const CODEC_ADDRESS: &str = "IOHDACodecAddress";
/// Function group type of the audio function group.
pub const CODEC_FUNCTION_GROUP_TYPE: &str = "IOHDACodecFunctionGroupType";
/// Layout id seen at attach.
pub const CODEC_LAYOUT_ID: &str = "IOHDACodecLayoutID";
/// The merged profile tree (debug builds).
pub const MERGED_PROFILE: &str = "Merged Profile";
/// Module name and version.
pub const MODULE_VERSION: &str = "RM,Version";
/// Build flavour.
pub const MODULE_BUILD: &str = "RM,Build";

/// One property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// 32-bit number.
    Number(u32),
    /// Text.
    Text(String),
    /// Structured tree.
    Tree(Value),
}

/// Properties of one driver instance, in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<&'static str, PropertyValue>,
}

impl Properties {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a numeric property.
    pub fn set_number(&mut self, key: &'static str, value: u32) {
        self.entries.insert(key, PropertyValue::Number(value));
    }

    /// Set a text property.
    pub fn set_text(&mut self, key: &'static str, value: impl Into<String>) {
        self.entries.insert(key, PropertyValue::Text(value.into()));
    }

    /// Set a tree property.
    pub fn set_tree(&mut self, key: &'static str, value: Value) {
        self.entries.insert(key, PropertyValue::Tree(value));
    }

    /// Look a property up.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    /// Numeric value of `key`, if set and numeric.
    pub fn number(&self, key: &str) -> Option<u32> {
        match self.get(key)? {
            PropertyValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Text value of `key`, if set and textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            PropertyValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PropertyValue)> + '_ {
        self.entries.iter().map(|(key, value)| (*key, value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_accessors() {
        let mut props = Properties::new();
        props.set_number(CODEC_VENDOR_ID, 0x10EC_0269);
        props.set_text(MODULE_BUILD, "Release-ci");
        assert_eq!(props.number(CODEC_VENDOR_ID), Some(0x10EC_0269));
        assert_eq!(props.text(CODEC_VENDOR_ID), None);
        assert_eq!(props.text(MODULE_BUILD), Some("Release-ci"));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let mut props = Properties::new();
        props.set_number(CODEC_ADDRESS, 2);
        props.set_tree(MERGED_PROFILE, json!({ "Send Delay": 300 }));
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(
            value,
            json!({ "IOHDACodecAddress": 2, "Merged Profile": { "Send Delay": 300 } })
        );
    }
}
