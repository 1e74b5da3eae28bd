// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Line items attached to ecommerce events.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::event::check_param;

/// A single line item inside an event's `items` parameter.
///
/// At least one of `item_id` or `item_name` is always present.
///
/// # Example
///
/// ```
/// use ga4mp_core::Item;
///
/// let mut item = Item::with_id("SKU_12345");
/// item.set_param("price", 9.99).unwrap();
/// item.set_param("quantity", 2).unwrap();
/// assert_eq!(item.item_id(), Some("SKU_12345"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Item {
	params: Map<String, Value>,
}

impl Item {
	/// Creates an item from an optional id and name.
	///
	/// Fails when both are `None`.
	pub fn new(item_id: Option<String>, item_name: Option<String>) -> Result<Self> {
		if item_id.is_none() && item_name.is_none() {
			return Err(CoreError::InvalidItem(
				"at least one of 'item_id' and 'item_name' is required".to_string(),
			));
		}

		let mut params = Map::new();
		if let Some(id) = item_id {
			params.insert("item_id".to_string(), Value::String(id));
		}
		if let Some(name) = item_name {
			params.insert("item_name".to_string(), Value::String(name));
		}
		Ok(Self { params })
	}

	/// Creates an item identified by `item_id`.
	pub fn with_id(item_id: impl Into<String>) -> Self {
		let mut params = Map::new();
		params.insert("item_id".to_string(), Value::String(item_id.into()));
		Self { params }
	}

	/// Creates an item identified by `item_name`.
	pub fn with_name(item_name: impl Into<String>) -> Self {
		let mut params = Map::new();
		params.insert("item_name".to_string(), Value::String(item_name.into()));
		Self { params }
	}

	/// Sets an item-scoped parameter such as `price`, `quantity` or `item_brand`.
	///
	/// The same name and value length limits as event parameters apply.
	/// Lists are never valid inside an item.
	pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
		let name = name.into();
		let value = value.into();
		check_param(&name, &value)?;
		if value.is_array() {
			return Err(CoreError::UnexpectedList { name });
		}
		self.params.insert(name, value);
		Ok(())
	}

	/// Returns the `item_id`, if set.
	pub fn item_id(&self) -> Option<&str> {
		self.params.get("item_id").and_then(Value::as_str)
	}

	/// Returns the `item_name`, if set.
	pub fn item_name(&self) -> Option<&str> {
		self.params.get("item_name").and_then(Value::as_str)
	}

	/// Gets an item parameter by name.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.params.get(name)
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.params)
	}
}

impl TryFrom<Value> for Item {
	type Error = CoreError;

	/// Validates a raw JSON item: it must be an object with a non-null
	/// `item_id` or `item_name`, and every entry must pass the same checks
	/// as [`Item::set_param`].
	fn try_from(value: Value) -> Result<Self> {
		let Value::Object(params) = value else {
			return Err(CoreError::InvalidItem(
				"'item' must be an object".to_string(),
			));
		};

		let has_identity = ["item_id", "item_name"]
			.iter()
			.any(|key| params.get(*key).is_some_and(|v| !v.is_null()));
		if !has_identity {
			return Err(CoreError::InvalidItem(
				"at least one of 'item_id' and 'item_name' is required".to_string(),
			));
		}

		for (name, value) in &params {
			check_param(name, value)?;
			if value.is_array() {
				return Err(CoreError::UnexpectedList { name: name.clone() });
			}
		}

		Ok(Self { params })
	}
}

impl From<Item> for Value {
	fn from(item: Item) -> Self {
		item.into_value()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn new_requires_id_or_name() {
		let result = Item::new(None, None);
		assert!(matches!(result, Err(CoreError::InvalidItem(_))));

		let item = Item::new(Some("SKU_1".to_string()), None).unwrap();
		assert_eq!(item.item_id(), Some("SKU_1"));
		assert_eq!(item.item_name(), None);

		let item = Item::new(None, Some("Stan and Friends Tee".to_string())).unwrap();
		assert_eq!(item.item_name(), Some("Stan and Friends Tee"));
	}

	#[test]
	fn set_param_rejects_lists() {
		let mut item = Item::with_id("SKU_1");
		let result = item.set_param("variants", json!(["red", "blue"]));
		assert!(matches!(result, Err(CoreError::UnexpectedList { .. })));
		assert!(item.get("variants").is_none());
	}

	#[test]
	fn set_param_enforces_value_length() {
		let mut item = Item::with_name("tee");
		let result = item.set_param("item_brand", "b".repeat(101));
		assert!(matches!(result, Err(CoreError::ParamValueTooLong { .. })));
	}

	#[test]
	fn try_from_object_with_name() {
		let item = Item::try_from(json!({"item_name": "tee", "price": 10.0})).unwrap();
		assert_eq!(item.item_name(), Some("tee"));
		assert_eq!(item.get("price"), Some(&json!(10.0)));
	}

	#[test]
	fn try_from_rejects_non_objects() {
		let result = Item::try_from(json!(["item_id", "SKU_1"]));
		assert!(matches!(result, Err(CoreError::InvalidItem(_))));

		let result = Item::try_from(json!("SKU_1"));
		assert!(matches!(result, Err(CoreError::InvalidItem(_))));
	}

	#[test]
	fn try_from_rejects_null_identity() {
		let result = Item::try_from(json!({"item_id": null, "price": 1}));
		assert!(matches!(result, Err(CoreError::InvalidItem(_))));
	}

	#[test]
	fn try_from_applies_set_param_limits() {
		let result = Item::try_from(json!({"item_id": "SKU_1", "item_brand": "b".repeat(101)}));
		assert!(matches!(result, Err(CoreError::ParamValueTooLong { .. })));

		let result = Item::try_from(json!({"item_id": "SKU_1", "variants": ["red", "blue"]}));
		assert!(matches!(result, Err(CoreError::UnexpectedList { .. })));

		let mut raw = json!({"item_id": "SKU_1"});
		raw["n".repeat(41).as_str()] = json!(1);
		let result = Item::try_from(raw);
		assert!(matches!(result, Err(CoreError::ParamNameTooLong { .. })));
	}

	#[test]
	fn serializes_as_flat_object() {
		let mut item = Item::with_id("SKU_1");
		item.set_param("quantity", 3).unwrap();
		let json = serde_json::to_value(&item).unwrap();
		assert_eq!(json, json!({"item_id": "SKU_1", "quantity": 3}));
	}
}
