// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the measurement SDK.

use std::path::PathBuf;

use ga4mp_core::{CoreError, Event};
use thiserror::Error;

use crate::client::BatchOutcome;
use crate::config::ConfigError;

/// Measurement SDK errors.
#[derive(Debug, Error)]
pub enum MeasurementError {
	/// Neither a web (measurement id) nor an app (firebase app id) identity was given.
	#[error("client identity is missing: set a measurement id and client id, or a firebase app id and app instance id")]
	MissingIdentity,

	/// API secret is missing or empty.
	#[error("API secret is missing")]
	MissingApiSecret,

	/// Base URL could not be parsed.
	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(String),

	/// HTTP request failed (connect, timeout, or reading the response body).
	///
	/// The wrapped error never carries the request URL.
	#[error("HTTP request failed: {0}")]
	RequestFailed(reqwest::Error),

	/// A non-reqwest transport failed before a response arrived.
	#[error("transport failed: {0}")]
	Transport(String),

	/// Collector answered with a non-2xx status.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// Request body could not be serialized.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Event construction or event list shape error.
	#[error(transparent)]
	Core(#[from] CoreError),

	/// Environment configuration could not be read.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// An immediate send stopped at `batch_number`.
	///
	/// `delivered` holds the outcomes of the batches that went through;
	/// `undelivered` holds the failed batch followed by every later event,
	/// in their original order, ready to be sent again.
	#[error("batch {batch_number} failed: {source}")]
	BatchFailed {
		batch_number: usize,
		delivered: Vec<BatchOutcome>,
		undelivered: Vec<Event>,
		#[source]
		source: Box<MeasurementError>,
	},

	/// A flush of postponed events stopped at `batch_number`.
	///
	/// The `requeued` undelivered events are still at the front of the
	/// postponed queue with their capture timestamps intact.
	#[error("flush failed at batch {batch_number}, {requeued} event(s) requeued: {source}")]
	FlushFailed {
		batch_number: usize,
		delivered: Vec<BatchOutcome>,
		requeued: usize,
		#[source]
		source: Box<MeasurementError>,
	},
}

/// Property store persistence errors.
///
/// These are logged where they happen and returned for inspection; the
/// store is always left in a usable state.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("failed to access property store at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("property store at {path} is not valid JSON: {source}")]
	Malformed {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("property store has no data location to save to")]
	NoLocation,
}

/// Result type alias for measurement operations.
pub type Result<T> = std::result::Result<T, MeasurementError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn batch_failed_exposes_source() {
		let err = MeasurementError::BatchFailed {
			batch_number: 2,
			delivered: Vec::new(),
			undelivered: Vec::new(),
			source: Box::new(MeasurementError::ServerError {
				status: 500,
				message: "backend".to_string(),
			}),
		};

		assert_eq!(err.to_string(), "batch 2 failed: server error (500): backend");
		let source = std::error::Error::source(&err).unwrap();
		assert_eq!(source.to_string(), "server error (500): backend");
	}

	#[test]
	fn core_errors_are_transparent() {
		let err = MeasurementError::from(CoreError::TooManyParams { max: 25 });
		assert_eq!(err.to_string(), "event cannot contain more than 25 parameters");
	}

	#[test]
	fn store_error_names_path() {
		let err = StoreError::Io {
			path: PathBuf::from("/tmp/ga4mp/store.json"),
			source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
		};
		assert!(err.to_string().contains("/tmp/ga4mp/store.json"));
	}
}
