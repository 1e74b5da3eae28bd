// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rust SDK for the GA4 Measurement Protocol.
//!
//! Sends events to Google Analytics 4 on behalf of a web stream (`gtag`,
//! addressed by measurement id and client id) or an app stream (`firebase`,
//! addressed by firebase app id and app instance id).
//!
//! # Features
//!
//! - Event construction with collector limits enforced up front
//! - Advisory parameter checks against well-known event types
//! - Automatic splitting into hits of at most 25 events
//! - Persistent user properties and session parameters merged into every hit
//! - Postponed events flushed later with their capture timestamps
//! - Validation endpoint diagnostics
//!
//! # Example
//!
//! ```no_run
//! use ga4mp::{Event, MeasurementClient, PropertyStore, SendOptions};
//!
//! # async fn example() -> ga4mp::Result<()> {
//! let store = PropertyStore::open("ga4mp_store.json").await;
//!
//! let mut client = MeasurementClient::builder()
//!     .gtag("G-XXXXXXXXXX", ga4mp::ClientIdentity::random_client_id())
//!     .api_secret("secret")
//!     .property_store(store)
//!     .build()?;
//!
//! let event = Event::new("level_up")?
//!     .with_param("character", "John Madden")?
//!     .with_param("level", "First")?;
//!
//! // Queue now, send later with the original timestamp.
//! client.send(vec![event], SendOptions::new().postponed()).await?;
//! let outcomes = client.flush().await?;
//! println!("sent {} hit(s)", outcomes.len());
//!
//! let _ = client.store_mut().save(None).await;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod payload;
pub mod store;
pub mod transport;

pub use batch::{split_into_batches, PostponedQueue, QueuedEvent};
pub use client::{BatchOutcome, MeasurementClient, MeasurementClientBuilder, SendOptions};
pub use config::{load_api_secret, ClientConfig, ConfigError};
pub use error::{MeasurementError, Result, StoreError};
pub use identity::ClientIdentity;
pub use payload::{ValidationMessage, ValidationResponse};
pub use store::{PropertyCategory, PropertyStore};
pub use transport::{HitRequest, HttpTransport, Transport, TransportResponse};

pub use ga4mp_core::{ApiSecret, CoreError, Event, Item, SchemaTable, SchemaWarning};
