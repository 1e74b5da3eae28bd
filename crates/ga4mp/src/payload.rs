// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request bodies sent to the collector and the validation response shape.

use ga4mp_core::{Event, MAX_PARAMS_PER_EVENT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::identity::ClientIdentity;
use crate::store::PropertyStore;

/// One event as it appears in a request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireEvent {
	pub name: String,
	pub params: Map<String, Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timestamp_micros: Option<i64>,
}

impl WireEvent {
	pub fn new(event: &Event, timestamp_micros: Option<i64>) -> Self {
		Self {
			name: event.name().to_string(),
			params: event.params().clone(),
			timestamp_micros,
		}
	}

	/// Copies session parameters the event does not set, while it stays
	/// under the per-event parameter limit.
	fn merge_session_parameters(&mut self, session: &Map<String, Value>) {
		for (name, value) in session {
			if self.params.len() >= MAX_PARAMS_PER_EVENT {
				break;
			}
			if !self.params.contains_key(name) {
				self.params.insert(name.clone(), value.clone());
			}
		}
	}
}

/// JSON body of one hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitBody {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub app_instance_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_id: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub non_personalized_ads: Option<Value>,
	#[serde(skip_serializing_if = "Map::is_empty")]
	pub user_properties: Map<String, Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timestamp_micros: Option<i64>,
	pub events: Vec<WireEvent>,
}

impl HitBody {
	/// Builds the body for one batch, merging the store's current state.
	pub fn build(
		identity: &ClientIdentity,
		store: &PropertyStore,
		mut events: Vec<WireEvent>,
		timestamp_micros: Option<i64>,
	) -> Self {
		let session = store.get_all_session_parameters();
		if !session.is_empty() {
			for event in &mut events {
				event.merge_session_parameters(session);
			}
		}

		let mut body = Self {
			client_id: None,
			app_instance_id: None,
			user_id: None,
			non_personalized_ads: None,
			user_properties: Map::new(),
			timestamp_micros,
			events,
		};

		match identity {
			ClientIdentity::Gtag { client_id, .. } => body.client_id = Some(client_id.clone()),
			ClientIdentity::Firebase {
				app_instance_id, ..
			} => body.app_instance_id = Some(app_instance_id.clone()),
		}

		for (name, value) in store.get_all_user_properties() {
			match name.as_str() {
				"user_id" => body.user_id = Some(value.clone()),
				"non_personalized_ads" => body.non_personalized_ads = Some(value.clone()),
				_ => {
					body
						.user_properties
						.insert(name.clone(), json!({ "value": value }));
				}
			}
		}

		body
	}
}

/// Diagnostics returned by the validation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
	#[serde(default)]
	pub validation_messages: Vec<ValidationMessage>,
}

impl ValidationResponse {
	/// True when the collector reported no problems with the hit.
	pub fn is_valid(&self) -> bool {
		self.validation_messages.is_empty()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMessage {
	#[serde(default)]
	pub field_path: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub validation_code: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn gtag() -> ClientIdentity {
		ClientIdentity::gtag("G-TEST", "555.1700000000")
	}

	fn level_end() -> WireEvent {
		let event = Event::new("level_end")
			.unwrap()
			.with_param("level_name", "First")
			.unwrap();
		WireEvent::new(&event, None)
	}

	#[test]
	fn user_id_is_top_level_and_others_nested() {
		let mut store = PropertyStore::new();
		store.set_user_property("user_id", "X");
		store.set_user_property("region", "East");

		let body = HitBody::build(&gtag(), &store, vec![level_end()], None);
		let json = serde_json::to_value(&body).unwrap();

		assert_eq!(json["user_id"], json!("X"));
		assert_eq!(json["user_properties"], json!({"region": {"value": "East"}}));
		assert!(json["user_properties"].get("user_id").is_none());
	}

	#[test]
	fn non_personalized_ads_is_top_level() {
		let mut store = PropertyStore::new();
		store.set_user_property("non_personalized_ads", true);

		let body = HitBody::build(&gtag(), &store, vec![level_end()], None);
		let json = serde_json::to_value(&body).unwrap();

		assert_eq!(json["non_personalized_ads"], json!(true));
		assert!(json.get("user_properties").is_none());
	}

	#[test]
	fn empty_store_sends_minimal_body() {
		let body = HitBody::build(&gtag(), &PropertyStore::new(), vec![level_end()], None);
		let json = serde_json::to_value(&body).unwrap();

		assert_eq!(
			json,
			json!({
				"client_id": "555.1700000000",
				"events": [{"name": "level_end", "params": {"level_name": "First"}}]
			})
		);
	}

	#[test]
	fn firebase_identity_uses_app_instance_id() {
		let identity = ClientIdentity::firebase("1:123:android:abc", "instance-1");
		let body = HitBody::build(&identity, &PropertyStore::new(), vec![level_end()], None);
		let json = serde_json::to_value(&body).unwrap();

		assert_eq!(json["app_instance_id"], json!("instance-1"));
		assert!(json.get("client_id").is_none());
	}

	#[test]
	fn timestamps_serialize_when_present() {
		let event = WireEvent::new(&Event::new("level_up").unwrap(), Some(1_700_000_000_000_000));
		let body = HitBody::build(&gtag(), &PropertyStore::new(), vec![event], Some(1_700_000_000_000_000));
		let json = serde_json::to_value(&body).unwrap();

		assert_eq!(json["timestamp_micros"], json!(1_700_000_000_000_000i64));
		assert_eq!(json["events"][0]["timestamp_micros"], json!(1_700_000_000_000_000i64));
	}

	#[test]
	fn session_parameters_fill_missing_params_only() {
		let mut store = PropertyStore::new();
		store.set_session_parameter("session_id", "123");
		store.set_session_parameter("level_name", "Ignored");

		let body = HitBody::build(&gtag(), &store, vec![level_end()], None);

		assert_eq!(body.events[0].params["session_id"], json!("123"));
		assert_eq!(body.events[0].params["level_name"], json!("First"));
		assert_eq!(store.get_all_session_parameters().len(), 2);
	}

	#[test]
	fn session_parameters_respect_param_limit() {
		let mut event = Event::new("busy").unwrap();
		for i in 0..MAX_PARAMS_PER_EVENT {
			event.set_param(format!("p{i}"), i as u64).unwrap();
		}
		let mut store = PropertyStore::new();
		store.set_session_parameter("session_id", "123");

		let body = HitBody::build(&gtag(), &store, vec![WireEvent::new(&event, None)], None);

		assert_eq!(body.events[0].params.len(), MAX_PARAMS_PER_EVENT);
		assert!(!body.events[0].params.contains_key("session_id"));
	}

	#[test]
	fn validation_response_parses_camel_case() {
		let raw = r#"{
			"validationMessages": [{
				"fieldPath": "events",
				"description": "Event at index: [0] has invalid name [_badEventName].",
				"validationCode": "NAME_RESERVED"
			}]
		}"#;
		let response: ValidationResponse = serde_json::from_str(raw).unwrap();

		assert!(!response.is_valid());
		assert_eq!(response.validation_messages[0].field_path, "events");
		assert_eq!(response.validation_messages[0].validation_code, "NAME_RESERVED");
	}

	#[test]
	fn empty_validation_response_is_valid() {
		let response: ValidationResponse = serde_json::from_str("{}").unwrap();
		assert!(response.is_valid());
	}
}
