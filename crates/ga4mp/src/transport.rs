// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP seam between the dispatcher and the collector.

use std::time::Duration;

use ga4mp_core::ApiSecret;
use reqwest::{header, Client, Url};
use tracing::debug;

use crate::error::{MeasurementError, Result};

/// SDK version sent in the `User-Agent` header.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
/// SDK name sent in the `User-Agent` header.
pub const SDK_NAME: &str = "ga4mp-rust";

/// Content type of every hit body.
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// One hit, ready to be posted.
#[derive(Debug, Clone)]
pub struct HitRequest {
	/// Collector URL without a query string.
	pub endpoint: String,
	/// Stream identifier query parameter, e.g. `("measurement_id", "G-XXXX")`.
	pub stream_param: (&'static str, String),
	pub api_secret: ApiSecret,
	/// Serialized JSON body.
	pub body: Vec<u8>,
}

/// Status and body of a collector response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
	pub status: u16,
	pub body: String,
}

impl TransportResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Posts hits to the collector.
///
/// A connection failure, timeout or unreadable body must be returned as an
/// error; any complete response, whatever its status, is returned as `Ok`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	async fn post(&self, request: HitRequest) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	http_client: Client,
}

impl HttpTransport {
	/// Builds a client with the given request timeout.
	pub fn new(timeout: Duration) -> Result<Self> {
		let http_client = Client::builder()
			.user_agent(format!("{SDK_NAME}/{SDK_VERSION}"))
			.timeout(timeout)
			.build()
			.map_err(MeasurementError::RequestFailed)?;

		Ok(Self { http_client })
	}

	/// Wraps an existing client.
	pub fn with_client(http_client: Client) -> Self {
		Self { http_client }
	}
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
	async fn post(&self, request: HitRequest) -> Result<TransportResponse> {
		let (stream_key, stream_id) = &request.stream_param;
		let url = Url::parse_with_params(
			&request.endpoint,
			[
				(*stream_key, stream_id.as_str()),
				("api_secret", request.api_secret.expose()),
			],
		)
		.map_err(|e| MeasurementError::InvalidBaseUrl(e.to_string()))?;

		debug!(
			endpoint = %request.endpoint,
			bytes = request.body.len(),
			"Posting hit"
		);

		let response = self
			.http_client
			.post(url)
			.header(header::CONTENT_TYPE, CONTENT_TYPE)
			.body(request.body)
			.send()
			.await
			.map_err(request_failed)?;

		let status = response.status().as_u16();
		let body = response.text().await.map_err(request_failed)?;

		Ok(TransportResponse { status, body })
	}
}

/// Drops the request URL from a reqwest error; it carries the API secret.
fn request_failed(error: reqwest::Error) -> MeasurementError {
	MeasurementError::RequestFailed(error.without_url())
}
