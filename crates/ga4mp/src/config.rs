// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration and environment loading.

use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use ga4mp_core::ApiSecret;
use thiserror::Error;

/// Production collector host.
pub const DEFAULT_BASE_URL: &str = "https://www.google-analytics.com";

/// Path of the collection endpoint, relative to the base URL.
pub const COLLECT_PATH: &str = "/mp/collect";

/// Path of the validation endpoint, relative to the base URL.
pub const DEBUG_COLLECT_PATH: &str = "/debug/mp/collect";

/// Hard cap on events per request enforced by the collector.
pub const MAX_EVENTS_PER_BATCH: usize = 25;

/// Environment variable holding the web stream measurement id.
pub const MEASUREMENT_ID_ENV: &str = "GA4MP_MEASUREMENT_ID";
/// Environment variable holding the web client id.
pub const CLIENT_ID_ENV: &str = "GA4MP_CLIENT_ID";
/// Environment variable holding the app stream firebase app id.
pub const FIREBASE_APP_ID_ENV: &str = "GA4MP_FIREBASE_APP_ID";
/// Environment variable holding the app instance id.
pub const APP_INSTANCE_ID_ENV: &str = "GA4MP_APP_INSTANCE_ID";
/// Environment variable holding the API secret (or `..._FILE` for a path to it).
pub const API_SECRET_ENV: &str = "GA4MP_API_SECRET";

/// Configuration for the measurement client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// Timeout for each HTTP request.
	pub request_timeout: Duration,
	/// Events per request; clamped into `1..=25` when the client is built.
	pub max_batch_size: usize,
	/// Scheme and host of the collector, without a trailing slash.
	pub base_url: String,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(10),
			max_batch_size: MAX_EVENTS_PER_BATCH,
			base_url: DEFAULT_BASE_URL.to_string(),
		}
	}
}

impl ClientConfig {
	/// Batch size the dispatcher will actually use.
	pub fn effective_batch_size(&self) -> usize {
		self.max_batch_size.clamp(1, MAX_EVENTS_PER_BATCH)
	}
}

/// Errors that can occur when reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Failed to read the secret file.
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The secret file path was empty.
	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Loads the API secret from `VAR`, or from the file named by `VAR_FILE`.
///
/// `VAR_FILE` takes precedence. A single trailing newline in the file is
/// stripped. Returns `Ok(None)` when neither is set.
pub fn load_api_secret(var: &str) -> Result<Option<ApiSecret>, ConfigError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(ConfigError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
			path: path.clone(),
			source,
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content);
		return Ok(Some(ApiSecret::new(secret)));
	}

	Ok(env::var(var).ok().map(ApiSecret::new))
}

/// Reads a non-empty plain environment variable.
pub(crate) fn env_value(var: &str) -> Option<String> {
	env::var(var).ok().filter(|v| !v.is_empty())
}
