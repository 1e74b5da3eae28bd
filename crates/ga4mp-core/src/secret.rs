// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for the Measurement Protocol API secret.

use std::fmt;

use zeroize::Zeroize;

/// The placeholder printed instead of the secret.
pub const REDACTED: &str = "[REDACTED]";

/// The API secret generated for a data stream.
///
/// `Debug` and `Display` print [`REDACTED`], so the secret is safe to pass
/// through `tracing` fields. The value is zeroized on drop and only
/// reachable through [`ApiSecret::expose`].
///
/// ```
/// use ga4mp_core::ApiSecret;
///
/// let secret = ApiSecret::new("bBQPQwnuTDWJcipSKuO6nw");
/// assert_eq!(format!("{secret}"), "[REDACTED]");
/// assert_eq!(secret.expose(), "bBQPQwnuTDWJcipSKuO6nw");
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct ApiSecret(String);

impl ApiSecret {
	pub fn new(secret: impl Into<String>) -> Self {
		Self(secret.into())
	}

	/// Returns the secret for use in the request query string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for ApiSecret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ApiSecret").field(&REDACTED).finish()
	}
}

impl fmt::Display for ApiSecret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for ApiSecret {
	fn from(secret: String) -> Self {
		Self(secret)
	}
}

impl From<&str> for ApiSecret {
	fn from(secret: &str) -> Self {
		Self(secret.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_is_redacted() {
		let secret = ApiSecret::new("b7o6YyW7Qu6LO8dfOu-NZA");
		let debug = format!("{secret:?}");
		assert_eq!(debug, "ApiSecret(\"[REDACTED]\")");
	}

	#[test]
	fn option_debug_is_redacted() {
		let secret = Some(ApiSecret::new("b7o6YyW7Qu6LO8dfOu-NZA"));
		assert!(!format!("{secret:?}").contains("b7o6"));
	}

	proptest! {
		#[test]
		fn display_never_contains_secret(inner in "[a-zA-Z0-9_-]{3,40}") {
			prop_assume!(!format!("ApiSecret(\"{REDACTED}\")").contains(&inner));
			let secret = ApiSecret::new(inner.clone());
			let display = format!("{secret}");
			let debug = format!("{secret:?}");
			prop_assert!(!display.contains(&inner));
			prop_assert!(!debug.contains(&inner));
		}
	}
}
