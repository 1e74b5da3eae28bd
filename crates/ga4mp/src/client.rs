// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Measurement client: validates, batches and dispatches events.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use ga4mp_core::{events_from_value, ApiSecret, Event, SchemaTable, SchemaWarning, REFERENCE_DOCS_URL};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::batch::{split_into_batches, PostponedQueue};
use crate::config::{
	env_value, load_api_secret, ClientConfig, API_SECRET_ENV, APP_INSTANCE_ID_ENV, CLIENT_ID_ENV,
	COLLECT_PATH, DEBUG_COLLECT_PATH, FIREBASE_APP_ID_ENV, MEASUREMENT_ID_ENV,
};
use crate::error::{MeasurementError, Result};
use crate::identity::ClientIdentity;
use crate::payload::{HitBody, ValidationResponse, WireEvent};
use crate::store::PropertyStore;
use crate::transport::{HitRequest, HttpTransport, Transport};

/// How far in the past a historical hit may be stamped and still be accepted.
pub const MAX_HISTORICAL_AGE_HOURS: i64 = 72;

/// Options for a single [`MeasurementClient::send`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
	/// Target the validation endpoint and return its diagnostics.
	///
	/// Ignored, with a warning, when combined with `postpone`:
	/// [`MeasurementClient::flush`] always targets the production endpoint.
	pub validation_mode: bool,
	/// Queue the events for a later [`MeasurementClient::flush`].
	pub postpone: bool,
	/// Historical hit time. Sent as `timestamp_micros` when set.
	pub as_of: Option<DateTime<Utc>>,
}

impl SendOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn validation(mut self) -> Self {
		self.validation_mode = true;
		self
	}

	pub fn postponed(mut self) -> Self {
		self.postpone = true;
		self
	}

	pub fn as_of(mut self, timestamp: DateTime<Utc>) -> Self {
		self.as_of = Some(timestamp);
		self
	}
}

/// Result of one dispatched batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
	/// 1-indexed position of the batch within its send or flush.
	pub batch_number: usize,
	pub event_count: usize,
	/// HTTP status returned by the collector.
	pub status: u16,
	/// Diagnostics, present only for validation-mode sends.
	pub validation: Option<ValidationResponse>,
}

impl BatchOutcome {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Builder for constructing a [`MeasurementClient`].
pub struct MeasurementClientBuilder {
	identity: Option<ClientIdentity>,
	api_secret: Option<ApiSecret>,
	config: ClientConfig,
	schema: Option<SchemaTable>,
	store: Option<PropertyStore>,
	transport: Option<Arc<dyn Transport>>,
}

impl MeasurementClientBuilder {
	/// Creates a new builder with default settings.
	pub fn new() -> Self {
		Self {
			identity: None,
			api_secret: None,
			config: ClientConfig::default(),
			schema: None,
			store: None,
			transport: None,
		}
	}

	/// Seeds the builder from `GA4MP_*` environment variables.
	///
	/// A web identity is taken from `GA4MP_MEASUREMENT_ID` (with
	/// `GA4MP_CLIENT_ID`, or a random client id when unset). Otherwise an app
	/// identity is taken from `GA4MP_FIREBASE_APP_ID` and
	/// `GA4MP_APP_INSTANCE_ID`. The secret comes from `GA4MP_API_SECRET` or the
	/// file named by `GA4MP_API_SECRET_FILE`.
	pub fn from_env() -> Result<Self> {
		let mut builder = Self::new();

		if let Some(measurement_id) = env_value(MEASUREMENT_ID_ENV) {
			let client_id = env_value(CLIENT_ID_ENV).unwrap_or_else(ClientIdentity::random_client_id);
			builder.identity = Some(ClientIdentity::gtag(measurement_id, client_id));
		} else if let (Some(app_id), Some(instance_id)) = (
			env_value(FIREBASE_APP_ID_ENV),
			env_value(APP_INSTANCE_ID_ENV),
		) {
			builder.identity = Some(ClientIdentity::firebase(app_id, instance_id));
		}

		builder.api_secret = load_api_secret(API_SECRET_ENV)?;

		Ok(builder)
	}

	/// Sends on behalf of a web stream.
	pub fn gtag(self, measurement_id: impl Into<String>, client_id: impl Into<String>) -> Self {
		self.identity(ClientIdentity::gtag(measurement_id, client_id))
	}

	/// Sends on behalf of an app stream.
	pub fn firebase(self, firebase_app_id: impl Into<String>, app_instance_id: impl Into<String>) -> Self {
		self.identity(ClientIdentity::firebase(firebase_app_id, app_instance_id))
	}

	pub fn identity(mut self, identity: ClientIdentity) -> Self {
		self.identity = Some(identity);
		self
	}

	pub fn api_secret(mut self, secret: impl Into<ApiSecret>) -> Self {
		self.api_secret = Some(secret.into());
		self
	}

	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	/// Sets the maximum events per hit. Clamped into `1..=25`.
	pub fn max_batch_size(mut self, size: usize) -> Self {
		self.config.max_batch_size = size;
		self
	}

	/// Sets the collector origin, e.g. `https://www.google-analytics.com`.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.config.base_url = url.into();
		self
	}

	pub fn config(mut self, config: ClientConfig) -> Self {
		self.config = config;
		self
	}

	/// Replaces the default table of well-known event types.
	pub fn schema(mut self, schema: SchemaTable) -> Self {
		self.schema = Some(schema);
		self
	}

	pub fn property_store(mut self, store: PropertyStore) -> Self {
		self.store = Some(store);
		self
	}

	/// Uses a custom transport instead of the default HTTP one.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Builds the client.
	pub fn build(self) -> Result<MeasurementClient> {
		let identity = self.identity.ok_or(MeasurementError::MissingIdentity)?;
		let api_secret = self
			.api_secret
			.filter(|secret| !secret.is_empty())
			.ok_or(MeasurementError::MissingApiSecret)?;

		let base_url = self.config.base_url.trim_end_matches('/').to_string();
		Url::parse(&base_url).map_err(|e| MeasurementError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

		let transport: Arc<dyn Transport> = match self.transport {
			Some(transport) => transport,
			None => Arc::new(HttpTransport::new(self.config.request_timeout)?),
		};

		let (stream_key, stream_id) = identity.stream_param();
		info!(
			base_url = %base_url,
			stream_key,
			stream_id,
			max_batch_size = self.config.effective_batch_size(),
			"Measurement client initialized"
		);

		Ok(MeasurementClient {
			identity,
			api_secret,
			config: ClientConfig {
				base_url,
				..self.config
			},
			transport,
			schema: self.schema.unwrap_or_default(),
			store: self.store.unwrap_or_default(),
			queue: PostponedQueue::new(),
		})
	}
}

impl Default for MeasurementClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Client for the GA4 Measurement Protocol.
///
/// Each call to [`send`](Self::send) runs to completion, one hit at a time
/// and in order. The client owns its property store, schema table and
/// postponed queue; share it across tasks behind a mutex.
///
/// # Example
///
/// ```no_run
/// use ga4mp::{Event, MeasurementClient, SendOptions};
///
/// # async fn example() -> ga4mp::Result<()> {
/// let mut client = MeasurementClient::builder()
///     .gtag("G-XXXXXXXXXX", "555.1700000000")
///     .api_secret("secret")
///     .build()?;
///
/// client.store_mut().set_user_property("user_id", "BabyYoda2000");
///
/// let event = Event::new("level_end")?
///     .with_param("level_name", "First")?
///     .with_param("success", "True")?;
///
/// let outcomes = client.send(vec![event], SendOptions::new()).await?;
/// assert!(outcomes.iter().all(|o| o.is_success()));
/// # Ok(())
/// # }
/// ```
pub struct MeasurementClient {
	identity: ClientIdentity,
	api_secret: ApiSecret,
	config: ClientConfig,
	transport: Arc<dyn Transport>,
	schema: SchemaTable,
	store: PropertyStore,
	queue: PostponedQueue,
}

impl MeasurementClient {
	/// Creates a new builder for configuring the client.
	pub fn builder() -> MeasurementClientBuilder {
		MeasurementClientBuilder::new()
	}

	/// Checks, then sends or queues `events`.
	///
	/// Immediate sends return one outcome per hit in dispatch order; postponed
	/// sends return an empty vector. The first transport failure or non-2xx
	/// status stops the send with [`MeasurementError::BatchFailed`], which
	/// carries every event that was not delivered.
	pub async fn send(&mut self, events: Vec<Event>, options: SendOptions) -> Result<Vec<BatchOutcome>> {
		self.check_params(&events);

		if let Some(as_of) = options.as_of {
			warn_if_outside_window(as_of);
		}

		if options.postpone {
			if options.validation_mode {
				warn!("Validation mode is ignored for postponed events; flush always targets the production endpoint");
			}
			let captured_at = options.as_of.unwrap_or_else(Utc::now);
			self.queue.enqueue_at(events, captured_at);
			return Ok(Vec::new());
		}

		let timestamp_micros = options.as_of.map(|t| t.timestamp_micros());
		let batches = split_into_batches(events, self.config.effective_batch_size());
		let batch_count = batches.len();
		let mut delivered = Vec::with_capacity(batch_count);

		for index in 0..batch_count {
			let batch_number = index + 1;
			let wire_events = batches[index]
				.iter()
				.map(|event| WireEvent::new(event, None))
				.collect();

			match self
				.send_batch(batch_number, batch_count, wire_events, timestamp_micros, options.validation_mode)
				.await
			{
				Ok(outcome) => delivered.push(outcome),
				Err(source) => {
					let undelivered: Vec<Event> = batches.into_iter().skip(index).flatten().collect();
					warn!(
						batch_number,
						batch_count,
						undelivered = undelivered.len(),
						error = %source,
						"Send stopped at failed batch"
					);
					return Err(MeasurementError::BatchFailed {
						batch_number,
						delivered,
						undelivered,
						source: Box::new(source),
					});
				}
			}
		}

		Ok(delivered)
	}

	/// Parses a raw JSON event list and sends it.
	///
	/// The list must be an array of `{"name": ..., "params": {...}}` objects;
	/// structural and field-length errors are returned before anything is sent.
	pub async fn send_value(&mut self, events: &Value, options: SendOptions) -> Result<Vec<BatchOutcome>> {
		let events = events_from_value(events)?;
		self.send(events, options).await
	}

	/// Sends every postponed event to the production endpoint.
	///
	/// Each event keeps its capture time as its own `timestamp_micros`; each
	/// hit is stamped with its first event's capture time. Events leave the
	/// queue only once their hit is accepted, so a failed or cancelled flush
	/// leaves every undelivered event queued in order. A hit whose response
	/// was never observed stays queued and is sent again by the next flush.
	pub async fn flush(&mut self) -> Result<Vec<BatchOutcome>> {
		let batch_size = self.config.effective_batch_size();
		let batch_count = self.queue.len().div_ceil(batch_size);
		if batch_count == 0 {
			return Ok(Vec::new());
		}

		debug!(count = self.queue.len(), batch_count, "Flushing postponed events");

		let mut delivered = Vec::with_capacity(batch_count);

		for index in 0..batch_count {
			let batch_number = index + 1;
			let timestamp_micros = self.queue.iter().next().map(|q| q.timestamp_micros);
			let wire_events: Vec<WireEvent> = self
				.queue
				.iter()
				.take(batch_size)
				.map(|q| WireEvent::new(&q.event, Some(q.timestamp_micros)))
				.collect();
			let event_count = wire_events.len();

			match self
				.send_batch(batch_number, batch_count, wire_events, timestamp_micros, false)
				.await
			{
				Ok(outcome) => {
					self.queue.remove_front(event_count);
					delivered.push(outcome);
				}
				Err(source) => {
					let requeued = self.queue.len();
					warn!(
						batch_number,
						batch_count,
						requeued,
						error = %source,
						"Flush stopped at failed batch, events remain queued"
					);
					return Err(MeasurementError::FlushFailed {
						batch_number,
						delivered,
						requeued,
						source: Box::new(source),
					});
				}
			}
		}

		Ok(delivered)
	}

	async fn send_batch(
		&self,
		batch_number: usize,
		batch_count: usize,
		events: Vec<WireEvent>,
		timestamp_micros: Option<i64>,
		validation_mode: bool,
	) -> Result<BatchOutcome> {
		let event_count = events.len();
		let body = HitBody::build(&self.identity, &self.store, events, timestamp_micros);
		let body = serde_json::to_vec(&body)?;

		let endpoint = self.endpoint(validation_mode);
		let (stream_key, stream_id) = self.identity.stream_param();

		debug!(
			batch_number,
			batch_count,
			event_count,
			endpoint = %endpoint,
			"Sending batch"
		);

		let response = self
			.transport
			.post(HitRequest {
				endpoint: endpoint.clone(),
				stream_param: (stream_key, stream_id.to_string()),
				api_secret: self.api_secret.clone(),
				body,
			})
			.await?;

		info!(
			batch_number,
			batch_count,
			event_count,
			status = response.status,
			endpoint = %endpoint,
			"Batch dispatched"
		);

		if !response.is_success() {
			return Err(MeasurementError::ServerError {
				status: response.status,
				message: response.body,
			});
		}

		let validation = if validation_mode {
			parse_validation(batch_number, &response.body)
		} else {
			None
		};

		Ok(BatchOutcome {
			batch_number,
			event_count,
			status: response.status,
			validation,
		})
	}

	fn endpoint(&self, validation_mode: bool) -> String {
		let path = if validation_mode {
			DEBUG_COLLECT_PATH
		} else {
			COLLECT_PATH
		};
		format!("{}{}", self.config.base_url, path)
	}

	/// Runs the advisory parameter check and logs each warning.
	pub fn check_params(&self, events: &[Event]) -> Vec<SchemaWarning> {
		let warnings = self.schema.check_events(events);
		for warning in &warnings {
			warn!(
				event_name = %warning.event_name,
				missing = %warning.missing,
				required = ?warning.required,
				docs = REFERENCE_DOCS_URL,
				"Event parameters do not match event type"
			);
		}
		warnings
	}

	/// Adds or replaces the recommended parameters for one event type.
	pub fn register_event_type<I, S>(&mut self, event_name: impl Into<String>, required: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.schema.register(event_name, required);
	}

	/// Merges `{event_name: [params]}` entries into the schema table.
	pub fn register_event_types<I, K, V, S>(&mut self, entries: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.schema.register_all(entries);
	}

	pub fn schema(&self) -> &SchemaTable {
		&self.schema
	}

	pub fn store(&self) -> &PropertyStore {
		&self.store
	}

	pub fn store_mut(&mut self) -> &mut PropertyStore {
		&mut self.store
	}

	pub fn identity(&self) -> &ClientIdentity {
		&self.identity
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Number of events waiting for [`flush`](Self::flush).
	pub fn queue_len(&self) -> usize {
		self.queue.len()
	}
}

fn parse_validation(batch_number: usize, body: &str) -> Option<ValidationResponse> {
	match serde_json::from_str::<ValidationResponse>(body) {
		Ok(response) => {
			for message in &response.validation_messages {
				warn!(
					batch_number,
					field_path = %message.field_path,
					validation_code = %message.validation_code,
					description = %message.description,
					"Validation message"
				);
			}
			Some(response)
		}
		Err(e) => {
			warn!(batch_number, error = %e, "Validation response could not be parsed");
			None
		}
	}
}

fn warn_if_outside_window(as_of: DateTime<Utc>) {
	let now = Utc::now();
	if as_of > now {
		warn!(as_of = %as_of, "Historical hit timestamp is in the future and will be ignored by the collector");
	} else if now - as_of > TimeDelta::hours(MAX_HISTORICAL_AGE_HOURS) {
		warn!(
			as_of = %as_of,
			max_age_hours = MAX_HISTORICAL_AGE_HOURS,
			"Historical hit timestamp is too old and will be ignored by the collector"
		);
	}
}
