// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Table of well-known event types and their recommended parameters.
//!
//! The check is advisory: an event that lacks recommended parameters is
//! still sent, and event names missing from the table pass silently so that
//! custom events work. Checking has no side effects, so the same input always
//! yields the same warnings.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::StructureError;
use crate::event::{raw_events, Event};

/// Reference documentation for recommended events and their parameters.
pub const REFERENCE_DOCS_URL: &str = "https://support.google.com/analytics/answer/9267735";

/// Seed table of automatically collected and recommended events.
#[rustfmt::skip]
const KNOWN_EVENTS: &[(&str, &[&str])] = &[
	("ad_click", &["ad_event_id"]),
	("ad_exposure", &["firebase_screen", "firebase_screen_id", "firebase_screen_class", "exposure_time"]),
	("ad_impression", &["ad_event_id"]),
	("ad_query", &["ad_event_id"]),
	("ad_reward", &["ad_unit_id", "reward_type", "reward_value"]),
	("add_payment_info", &["coupon", "currency", "items", "payment_type", "value"]),
	("add_shipping_info", &["coupon", "currency", "items", "shipping_tier", "value"]),
	("add_to_cart", &["currency", "items", "value"]),
	("add_to_wishlist", &["currency", "items", "value"]),
	("adunit_exposure", &["firebase_screen", "firebase_screen_id", "firebase_screen_class", "exposure_time"]),
	("app_clear_data", &[]),
	("app_exception", &["fatal", "timestamp", "engagement_time_msec"]),
	("app_remove", &[]),
	("app_store_refund", &["product_id", "value", "currency", "quantity"]),
	("app_store_subscription_cancel", &["product_id", "price", "value", "currency", "cancellation_reason"]),
	("app_store_subscription_convert", &["product_id", "price", "value", "currency", "quantity"]),
	("app_store_subscription_renew", &["product_id", "price", "value", "currency", "quantity", "renewal_count"]),
	("app_update", &["previous_app_version"]),
	("begin_checkout", &["coupon", "currency", "items", "value"]),
	("click", &[]),
	("dynamic_link_app_open", &["source", "medium", "campaign", "link_id", "accept_time"]),
	("dynamic_link_app_update", &["source", "medium", "campaign", "link_id", "accept_time"]),
	("dynamic_link_first_open", &["source", "medium", "campaign", "link_id", "accept_time"]),
	("earn_virtual_currency", &["virtual_currency_name", "value"]),
	("error", &["firebase_error", "firebase_error_value"]),
	("file_download", &["file_extension", "file_name", "link_classes", "link_domain", "link_id", "link_text", "link_url"]),
	("firebase_campaign", &["source", "medium", "campaign", "term", "content", "gclid", "aclid", "cp1", "anid", "click_timestamp", "campaign_info_source"]),
	("firebase_in_app_message_action", &["message_name", "message_device_time", "message_id"]),
	("firebase_in_app_message_dismiss", &["message_name", "message_device_time", "message_id"]),
	("firebase_in_app_message_impression", &["message_name", "message_device_time", "message_id"]),
	("first_open", &["previous_gmp_app_id", "updated_with_analytics", "previous_first_open_count", "system_app", "system_app_update", "deferred_analytics_collection", "reset_analytics_cause", "engagement_time_msec"]),
	("first_visit", &[]),
	("generate_lead", &["value", "currency"]),
	("in_app_purchase", &["product_id", "price", "value", "currency", "quantity", "subscription", "free_trial", "introductory_price"]),
	("join_group", &["group_id"]),
	("level_end", &["level_name", "success"]),
	("level_start", &["level_name"]),
	("level_up", &["character", "level"]),
	("login", &["method"]),
	("notification_dismiss", &["message_name", "message_time", "message_device_time", "message_id", "topic", "label", "message_channel"]),
	("notification_foreground", &["message_name", "message_time", "message_device_time", "message_id", "topic", "label", "message_channel", "message_type"]),
	("notification_open", &["message_name", "message_time", "message_device_time", "message_id", "topic", "label", "message_channel"]),
	("notification_receive", &["message_name", "message_time", "message_device_time", "message_id", "topic", "label", "message_channel", "message_type"]),
	("notification_send", &["message_name", "message_time", "message_device_time", "message_id", "topic", "label", "message_channel"]),
	("os_update", &["previous_os_version"]),
	("page_view", &["page_location", "page_referrer"]),
	("post_score", &["level", "character", "score"]),
	("purchase", &["transaction_id", "value", "currency", "tax", "shipping", "items", "coupon"]),
	("refund", &["transaction_id", "value", "currency", "tax", "shipping", "items"]),
	("remove_from_cart", &["currency", "items", "value"]),
	("screen_view", &["firebase_screen", "firebase_screen_class", "firebase_screen_id", "firebase_previous_screen", "firebase_previous_class", "firebase_previous_id", "engagement_time_msec"]),
	("scroll", &[]),
	("search", &["search_term"]),
	("select_content", &["content_type", "item_id"]),
	("select_item", &["items", "item_list_name", "item_list_id"]),
	("select_promotion", &["items", "promotion_id", "promotion_name", "creative_name", "creative_slot", "location_id"]),
	("session_start", &[]),
	("share", &["content_type", "item_id"]),
	("sign_up", &["method"]),
	("spend_virtual_currency", &["item_name", "virtual_currency_name", "value"]),
	("tutorial_begin", &[]),
	("tutorial_complete", &[]),
	("unlock_achievement", &["achievement_id"]),
	("user_engagement", &["engagement_time_msec"]),
	("video_complete", &["video_current_time", "video_duration", "video_percent", "video_provider", "video_title", "video_url", "visible"]),
	("video_progress", &["video_current_time", "video_duration", "video_percent", "video_provider", "video_title", "video_url", "visible"]),
	("video_start", &["video_current_time", "video_duration", "video_percent", "video_provider", "video_title", "video_url", "visible"]),
	("view_cart", &["currency", "items", "value"]),
	("view_item", &["currency", "items", "value"]),
	("view_item_list", &["items", "item_list_name", "item_list_id"]),
	("view_promotion", &["items", "promotion_id", "promotion_name", "creative_name", "creative_slot", "location_id"]),
	("view_search_results", &["search_term"]),
];

/// One recommended parameter missing from an event of a known type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaWarning {
	pub event_name: String,
	/// The parameter that triggered this warning.
	pub missing: String,
	/// Every recommended parameter for the event type, in table order.
	pub required: Vec<String>,
}

impl fmt::Display for SchemaWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"event parameters do not match event type: for {} the correct parameter(s) are {:?}; \
			 the parameter '{}' triggered this warning; see {}",
			self.event_name, self.required, self.missing, REFERENCE_DOCS_URL
		)
	}
}

/// Mapping from event name to its recommended parameter names.
///
/// Each client owns its own table, so independently configured clients in
/// one process never see each other's registrations.
///
/// # Example
///
/// ```
/// use ga4mp_core::{Event, SchemaTable};
///
/// let mut table = SchemaTable::new();
/// table.register("boss_defeated", ["boss_name", "attempts"]);
///
/// let event = Event::new("boss_defeated").unwrap().with_param("boss_name", "Ganon").unwrap();
/// let warnings = table.check_event(&event);
/// assert_eq!(warnings.len(), 1);
/// assert_eq!(warnings[0].missing, "attempts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTable {
	entries: HashMap<String, Vec<String>>,
}

impl SchemaTable {
	/// Creates a table seeded with the well-known event types.
	pub fn new() -> Self {
		let entries = KNOWN_EVENTS
			.iter()
			.map(|(name, params)| {
				(
					(*name).to_string(),
					params.iter().map(|p| (*p).to_string()).collect(),
				)
			})
			.collect();
		Self { entries }
	}

	/// Creates a table with no entries; every event passes unchecked.
	pub fn empty() -> Self {
		Self {
			entries: HashMap::new(),
		}
	}

	/// Adds or replaces the entry for `event_name`. Last write wins.
	pub fn register<I, S>(&mut self, event_name: impl Into<String>, required: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self
			.entries
			.insert(event_name.into(), required.into_iter().map(Into::into).collect());
	}

	/// Merges a batch of `event_name -> [required params]` entries.
	pub fn register_all<I, K, V, S>(&mut self, entries: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for (name, required) in entries {
			self.register(name, required);
		}
	}

	/// Returns the recommended parameters for an event name, if known.
	pub fn required_params(&self, event_name: &str) -> Option<&[String]> {
		self.entries.get(event_name).map(Vec::as_slice)
	}

	pub fn contains(&self, event_name: &str) -> bool {
		self.entries.contains_key(event_name)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Warnings for one event, one per missing recommended parameter.
	pub fn check_params(&self, event_name: &str, params: &Map<String, Value>) -> Vec<SchemaWarning> {
		let Some(required) = self.entries.get(event_name) else {
			return Vec::new();
		};

		required
			.iter()
			.filter(|param| !params.contains_key(param.as_str()))
			.map(|param| SchemaWarning {
				event_name: event_name.to_string(),
				missing: param.clone(),
				required: required.clone(),
			})
			.collect()
	}

	pub fn check_event(&self, event: &Event) -> Vec<SchemaWarning> {
		self.check_params(event.name(), event.params())
	}

	/// Warnings for a list of events, in event order.
	pub fn check_events(&self, events: &[Event]) -> Vec<SchemaWarning> {
		events.iter().flat_map(|e| self.check_event(e)).collect()
	}

	/// Checks a raw JSON event list.
	///
	/// Shape violations are returned as errors before any event is checked.
	pub fn check_value(&self, events: &Value) -> Result<Vec<SchemaWarning>, StructureError> {
		Ok(
			raw_events(events)?
				.into_iter()
				.flat_map(|raw| self.check_params(raw.name, raw.params))
				.collect(),
		)
	}
}

impl Default for SchemaTable {
	fn default() -> Self {
		Self::new()
	}
}
