// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event model for measurement hits.
//!
//! An [`Event`] is a name plus at most [`MAX_PARAMS_PER_EVENT`] parameters.
//! Limits are checked when the event is built, so an event that exists is
//! always within the collector's per-event limits. Only the `items`
//! parameter may hold a list.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CoreError, Result, StructureError};
use crate::item::Item;

/// Maximum length of an event name, in characters.
pub const MAX_EVENT_NAME_LENGTH: usize = 40;

/// Maximum length of a parameter name, in characters.
pub const MAX_PARAM_NAME_LENGTH: usize = 40;

/// Maximum length of a string parameter value, in characters.
pub const MAX_PARAM_VALUE_LENGTH: usize = 100;

/// Maximum number of parameters on a single event, `items` included.
pub const MAX_PARAMS_PER_EVENT: usize = 25;

/// Practical collector limit on line items per event.
///
/// Documented only; the collector truncates, this crate does not.
pub const MAX_ITEMS_PER_EVENT: usize = 100;

/// Name of the only list-valued parameter.
pub const ITEMS_PARAM: &str = "items";

/// A named event with bounded parameters.
///
/// # Example
///
/// ```
/// use ga4mp_core::{Event, Item};
///
/// let mut event = Event::new("purchase").unwrap();
/// event.set_param("transaction_id", "T_12345").unwrap();
/// event.set_param("value", 25.42).unwrap();
/// event.set_param("currency", "USD").unwrap();
/// event.add_item(Item::with_id("SKU_12345")).unwrap();
///
/// assert_eq!(event.param_count(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
	name: String,
	params: Map<String, Value>,
}

impl Event {
	/// Creates an event with no parameters.
	pub fn new(name: impl Into<String>) -> Result<Self> {
		let name = name.into();
		if name.chars().count() > MAX_EVENT_NAME_LENGTH {
			return Err(CoreError::EventNameTooLong {
				name,
				max: MAX_EVENT_NAME_LENGTH,
			});
		}
		Ok(Self {
			name,
			params: Map::new(),
		})
	}

	/// Sets a parameter, replacing any previous value under the same name.
	///
	/// Adding a new parameter to an event that already holds
	/// [`MAX_PARAMS_PER_EVENT`] fails and leaves the event unchanged.
	pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
		let name = name.into();
		let value = value.into();
		check_param(&name, &value)?;

		match &value {
			Value::Array(items) => {
				if name != ITEMS_PARAM {
					return Err(CoreError::UnexpectedList { name });
				}
				for item in items {
					Item::try_from(item.clone())?;
				}
			}
			_ if name == ITEMS_PARAM => return Err(CoreError::ItemsNotAList),
			_ => {}
		}

		if !self.params.contains_key(&name) && self.params.len() >= MAX_PARAMS_PER_EVENT {
			return Err(CoreError::TooManyParams {
				max: MAX_PARAMS_PER_EVENT,
			});
		}

		self.params.insert(name, value);
		Ok(())
	}

	/// Sets a parameter (builder pattern).
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
		self.set_param(name, value)?;
		Ok(self)
	}

	/// Appends a line item, creating the `items` parameter when absent.
	pub fn add_item(&mut self, item: Item) -> Result<()> {
		if !self.params.contains_key(ITEMS_PARAM) {
			self.set_param(ITEMS_PARAM, Value::Array(Vec::new()))?;
		}
		match self.params.get_mut(ITEMS_PARAM) {
			Some(Value::Array(items)) => {
				items.push(item.into_value());
				Ok(())
			}
			_ => Err(CoreError::ItemsNotAList),
		}
	}

	/// Appends a raw JSON line item after validating its shape.
	pub fn add_item_value(&mut self, item: Value) -> Result<()> {
		let item = Item::try_from(item)?;
		self.add_item(item)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn params(&self) -> &Map<String, Value> {
		&self.params
	}

	pub fn param(&self, name: &str) -> Option<&Value> {
		self.params.get(name)
	}

	pub fn param_count(&self) -> usize {
		self.params.len()
	}

	/// Returns the line items, if the event has any.
	pub fn items(&self) -> Option<&[Value]> {
		match self.params.get(ITEMS_PARAM) {
			Some(Value::Array(items)) => Some(items.as_slice()),
			_ => None,
		}
	}

	/// Consumes the event, returning its name and parameters.
	pub fn into_parts(self) -> (String, Map<String, Value>) {
		(self.name, self.params)
	}
}

/// Checks name and scalar value length limits shared by events and items.
pub(crate) fn check_param(name: &str, value: &Value) -> Result<()> {
	if name.chars().count() > MAX_PARAM_NAME_LENGTH {
		return Err(CoreError::ParamNameTooLong {
			name: name.to_string(),
			max: MAX_PARAM_NAME_LENGTH,
		});
	}
	if let Value::String(s) = value {
		if s.chars().count() > MAX_PARAM_VALUE_LENGTH {
			return Err(CoreError::ParamValueTooLong {
				name: name.to_string(),
				max: MAX_PARAM_VALUE_LENGTH,
			});
		}
	}
	Ok(())
}

/// A borrowed view of one event inside a raw JSON event list.
#[derive(Debug, Clone, Copy)]
pub struct RawEvent<'a> {
	pub index: usize,
	pub name: &'a str,
	pub params: &'a Map<String, Value>,
}

/// Checks the shape of a raw JSON event list without applying field limits.
///
/// Every element must be an object with a string `name` and an object
/// `params`. The first violation is returned.
pub fn raw_events(value: &Value) -> std::result::Result<Vec<RawEvent<'_>>, StructureError> {
	let Value::Array(list) = value else {
		return Err(StructureError::NotAList);
	};

	list
		.iter()
		.enumerate()
		.map(|(index, event)| {
			let Value::Object(event) = event else {
				return Err(StructureError::EventNotAnObject { index });
			};
			let name = match event.get("name") {
				None => return Err(StructureError::MissingName { index }),
				Some(Value::String(name)) => name.as_str(),
				Some(_) => return Err(StructureError::NameNotAString { index }),
			};
			let params = match event.get("params") {
				None => return Err(StructureError::MissingParams { index }),
				Some(Value::Object(params)) => params,
				Some(_) => return Err(StructureError::ParamsNotAnObject { index }),
			};
			Ok(RawEvent {
				index,
				name,
				params,
			})
		})
		.collect()
}

/// Builds typed events from a raw JSON event list.
///
/// Structural errors come first; field limits are then applied exactly as
/// [`Event::new`] and [`Event::set_param`] apply them.
pub fn events_from_value(value: &Value) -> Result<Vec<Event>> {
	raw_events(value)?
		.into_iter()
		.map(|raw| {
			let mut event = Event::new(raw.name)?;
			for (name, value) in raw.params {
				event.set_param(name.clone(), value.clone())?;
			}
			Ok(event)
		})
		.collect()
}
