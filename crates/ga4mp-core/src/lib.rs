// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the GA4 Measurement Protocol.
//!
//! This crate holds everything that does not touch the network or the disk:
//! the event model and its collector limits, line items, the table of
//! well-known event types used for advisory parameter checks, and the
//! redacting API secret wrapper. It is used by the `ga4mp` SDK.
//!
//! # Example
//!
//! ```
//! use ga4mp_core::{Event, SchemaTable};
//!
//! let event = Event::new("level_end")
//!     .unwrap()
//!     .with_param("level_name", "First")
//!     .unwrap();
//!
//! let warnings = SchemaTable::new().check_event(&event);
//! assert_eq!(warnings.len(), 1);
//! assert_eq!(warnings[0].missing, "success");
//! ```

pub mod error;
pub mod event;
pub mod item;
pub mod schema;
pub mod secret;

pub use error::{CoreError, Result, StructureError};
pub use event::{
	events_from_value, raw_events, Event, RawEvent, ITEMS_PARAM, MAX_EVENT_NAME_LENGTH,
	MAX_ITEMS_PER_EVENT, MAX_PARAMS_PER_EVENT, MAX_PARAM_NAME_LENGTH, MAX_PARAM_VALUE_LENGTH,
};
pub use item::Item;
pub use schema::{SchemaTable, SchemaWarning, REFERENCE_DOCS_URL};
pub use secret::{ApiSecret, REDACTED};
