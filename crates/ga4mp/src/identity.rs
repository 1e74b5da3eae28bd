// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Who a hit is sent on behalf of.

use chrono::Utc;

/// Identifies the data stream and the device or browser instance.
///
/// Web streams are addressed by `measurement_id` and identify the browser
/// with a `client_id`. App streams are addressed by `firebase_app_id` and
/// identify the installation with an `app_instance_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
	Gtag {
		measurement_id: String,
		client_id: String,
	},
	Firebase {
		firebase_app_id: String,
		app_instance_id: String,
	},
}

impl ClientIdentity {
	pub fn gtag(measurement_id: impl Into<String>, client_id: impl Into<String>) -> Self {
		Self::Gtag {
			measurement_id: measurement_id.into(),
			client_id: client_id.into(),
		}
	}

	pub fn firebase(firebase_app_id: impl Into<String>, app_instance_id: impl Into<String>) -> Self {
		Self::Firebase {
			firebase_app_id: firebase_app_id.into(),
			app_instance_id: app_instance_id.into(),
		}
	}

	/// Query-string key and value addressing the data stream.
	pub fn stream_param(&self) -> (&'static str, &str) {
		match self {
			Self::Gtag { measurement_id, .. } => ("measurement_id", measurement_id.as_str()),
			Self::Firebase {
				firebase_app_id, ..
			} => ("firebase_app_id", firebase_app_id.as_str()),
		}
	}

	/// Body key and value identifying the instance.
	pub fn instance_field(&self) -> (&'static str, &str) {
		match self {
			Self::Gtag { client_id, .. } => ("client_id", client_id.as_str()),
			Self::Firebase {
				app_instance_id, ..
			} => ("app_instance_id", app_instance_id.as_str()),
		}
	}

	/// Generates a `client_id` in the browser cookie format `<random>.<unix seconds>`.
	pub fn random_client_id() -> String {
		format!("{}.{}", fastrand::u32(..), Utc::now().timestamp())
	}
}
