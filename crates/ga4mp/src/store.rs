// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistent user, session and other properties.
//!
//! The store is plain in-memory state that can be hydrated from and saved to
//! a JSON file. Persistence is best-effort: failures are logged and returned
//! as [`StoreError`], and the in-memory state stays usable either way. The
//! store is never saved implicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::error::StoreError;

/// One of the three independent property partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyCategory {
	/// Merged into every hit as user properties.
	User,
	/// Copied into each event's params when the event does not set them.
	Session,
	/// Caller-owned state; persisted but never sent.
	Other,
}

impl PropertyCategory {
	/// Key of this category in the persisted JSON document.
	pub fn key(self) -> &'static str {
		match self {
			Self::User => "user_properties",
			Self::Session => "session_parameters",
			Self::Other => "other",
		}
	}
}

/// Durable key/value state merged into outgoing hits.
///
/// # Example
///
/// ```no_run
/// use ga4mp::PropertyStore;
///
/// # async fn example() {
/// let mut store = PropertyStore::open("ga4mp_store.json").await;
/// store.set_user_property("user_id", "BabyYoda2000");
/// store.set_user_property("region", "Outer Rim");
/// store.set_session_parameter("session_id", "1700000000");
/// let _ = store.save(None).await;
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyStore {
	#[serde(default)]
	user_properties: Map<String, Value>,
	#[serde(default)]
	session_parameters: Map<String, Value>,
	#[serde(default)]
	other: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	data_location: Option<PathBuf>,
}

impl PropertyStore {
	/// Creates an empty, memory-only store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store backed by `path`, hydrating it from the file.
	///
	/// Never fails: a missing file is created empty, an unreadable or
	/// malformed one is logged and replaced by empty in-memory state.
	pub async fn open(path: impl AsRef<Path>) -> Self {
		let mut store = Self::new();
		let _ = store.load(path).await;
		store
	}

	/// Replaces the in-memory state with the contents of `path`.
	///
	/// When the file does not exist an empty document is written there. On
	/// any failure the store falls back to empty categories bound to `path`.
	pub async fn load(&mut self, path: impl AsRef<Path>) -> Result<(), StoreError> {
		let path = path.as_ref().to_path_buf();

		let contents = match fs::read_to_string(&path).await {
			Ok(contents) => contents,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %path.display(), "Property store not found, creating empty store");
				self.reset(path.clone());
				return self.write_to(&path).await;
			}
			Err(source) => {
				warn!(path = %path.display(), error = %source, "Failed to read property store, using empty store");
				self.reset(path.clone());
				return Err(StoreError::Io { path, source });
			}
		};

		match serde_json::from_str::<PropertyStore>(&contents) {
			Ok(mut loaded) => {
				loaded.data_location = Some(path.clone());
				*self = loaded;
				debug!(
					path = %path.display(),
					user_properties = self.user_properties.len(),
					session_parameters = self.session_parameters.len(),
					"Property store loaded"
				);
				Ok(())
			}
			Err(source) => {
				warn!(path = %path.display(), error = %source, "Property store is malformed, using empty store");
				self.reset(path.clone());
				Err(StoreError::Malformed { path, source })
			}
		}
	}

	/// Writes the full state to `target`, or to the location it was loaded
	/// from or last saved to.
	///
	/// A failed save leaves the in-memory state untouched.
	pub async fn save(&mut self, target: Option<&Path>) -> Result<(), StoreError> {
		let path = match target.map(Path::to_path_buf).or_else(|| self.data_location.clone()) {
			Some(path) => path,
			None => {
				warn!("Property store has no data location, nothing saved");
				return Err(StoreError::NoLocation);
			}
		};

		let previous = self.data_location.replace(path.clone());
		let result = self.write_to(&path).await;
		if result.is_err() {
			self.data_location = previous;
		}
		result
	}

	async fn write_to(&self, path: &Path) -> Result<(), StoreError> {
		let io_err = |source| StoreError::Io {
			path: path.to_path_buf(),
			source,
		};

		let result = async {
			if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
				fs::create_dir_all(parent).await?;
			}

			let contents = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

			let temp_path = path.with_extension("tmp");
			let mut file = fs::File::create(&temp_path).await?;
			file.write_all(contents.as_bytes()).await?;
			file.sync_all().await?;
			drop(file);

			fs::rename(&temp_path, path).await
		}
		.await;

		match result {
			Ok(()) => {
				debug!(path = %path.display(), "Property store written");
				Ok(())
			}
			Err(source) => {
				error!(path = %path.display(), error = %source, "Failed to write property store");
				Err(io_err(source))
			}
		}
	}

	fn reset(&mut self, path: PathBuf) {
		*self = Self {
			data_location: Some(path),
			..Self::default()
		};
	}

	/// Where the store was last loaded from or saved to.
	pub fn data_location(&self) -> Option<&Path> {
		self.data_location.as_deref()
	}

	fn category(&self, category: PropertyCategory) -> &Map<String, Value> {
		match category {
			PropertyCategory::User => &self.user_properties,
			PropertyCategory::Session => &self.session_parameters,
			PropertyCategory::Other => &self.other,
		}
	}

	fn category_mut(&mut self, category: PropertyCategory) -> &mut Map<String, Value> {
		match category {
			PropertyCategory::User => &mut self.user_properties,
			PropertyCategory::Session => &mut self.session_parameters,
			PropertyCategory::Other => &mut self.other,
		}
	}

	pub fn set(&mut self, category: PropertyCategory, name: impl Into<String>, value: impl Into<Value>) {
		self.category_mut(category).insert(name.into(), value.into());
	}

	pub fn get(&self, category: PropertyCategory, name: &str) -> Option<&Value> {
		self.category(category).get(name)
	}

	pub fn get_all(&self, category: PropertyCategory) -> &Map<String, Value> {
		self.category(category)
	}

	/// Removes one property, returning its previous value.
	pub fn delete(&mut self, category: PropertyCategory, name: &str) -> Option<Value> {
		self.category_mut(category).remove(name)
	}

	/// Empties one category without touching the others.
	pub fn clear(&mut self, category: PropertyCategory) {
		self.category_mut(category).clear();
	}

	// Category wrappers.

	pub fn set_user_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.set(PropertyCategory::User, name, value);
	}

	pub fn get_user_property(&self, name: &str) -> Option<&Value> {
		self.get(PropertyCategory::User, name)
	}

	pub fn get_all_user_properties(&self) -> &Map<String, Value> {
		self.get_all(PropertyCategory::User)
	}

	pub fn delete_user_property(&mut self, name: &str) -> Option<Value> {
		self.delete(PropertyCategory::User, name)
	}

	pub fn clear_user_properties(&mut self) {
		self.clear(PropertyCategory::User);
	}

	pub fn set_session_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.set(PropertyCategory::Session, name, value);
	}

	pub fn get_session_parameter(&self, name: &str) -> Option<&Value> {
		self.get(PropertyCategory::Session, name)
	}

	pub fn get_all_session_parameters(&self) -> &Map<String, Value> {
		self.get_all(PropertyCategory::Session)
	}

	pub fn delete_session_parameter(&mut self, name: &str) -> Option<Value> {
		self.delete(PropertyCategory::Session, name)
	}

	pub fn clear_session_parameters(&mut self) {
		self.clear(PropertyCategory::Session);
	}

	pub fn set_other(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.set(PropertyCategory::Other, name, value);
	}

	pub fn get_other(&self, name: &str) -> Option<&Value> {
		self.get(PropertyCategory::Other, name)
	}

	pub fn get_all_other(&self) -> &Map<String, Value> {
		self.get_all(PropertyCategory::Other)
	}

	pub fn delete_other(&mut self, name: &str) -> Option<Value> {
		self.delete(PropertyCategory::Other, name)
	}

	pub fn clear_other(&mut self) {
		self.clear(PropertyCategory::Other);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	#[test]
	fn categories_are_independent() {
		let mut store = PropertyStore::new();
		store.set_user_property("user_id", "Grogu");
		store.set_user_property("region", "Outer Rim");
		store.set_session_parameter("session_id", "123");
		store.set_other("last_sync", 42);

		assert_eq!(store.get_all_user_properties().len(), 2);

		store.clear_user_properties();
		assert!(store.get_all_user_properties().is_empty());
		assert_eq!(store.get_session_parameter("session_id"), Some(&json!("123")));
		assert_eq!(store.get_other("last_sync"), Some(&json!(42)));
	}

	#[test]
	fn delete_removes_only_named_key() {
		let mut store = PropertyStore::new();
		store.set_user_property("user_id", "Grogu");
		store.set_user_property("region", "Outer Rim");

		assert_eq!(store.delete_user_property("user_id"), Some(json!("Grogu")));
		assert!(store.get_user_property("user_id").is_none());
		assert_eq!(store.get_user_property("region"), Some(&json!("Outer Rim")));
		assert_eq!(store.delete_user_property("user_id"), None);
	}

	#[test]
	fn set_overwrites_existing_key() {
		let mut store = PropertyStore::new();
		store.set(PropertyCategory::Session, "session_id", "1");
		store.set(PropertyCategory::Session, "session_id", "2");
		assert_eq!(store.get_all(PropertyCategory::Session).len(), 1);
		assert_eq!(store.get(PropertyCategory::Session, "session_id"), Some(&json!("2")));
	}

	#[test]
	fn serialized_document_always_has_categories() {
		let store = PropertyStore::new();
		let json = serde_json::to_value(&store).unwrap();
		assert_eq!(json["user_properties"], json!({}));
		assert_eq!(json["session_parameters"], json!({}));
		assert!(json.get("data_location").is_none());
	}

	#[test]
	fn partial_document_deserializes_with_empty_categories() {
		let store: PropertyStore =
			serde_json::from_str(r#"{"user_properties": {"user_id": "X"}}"#).unwrap();
		assert_eq!(store.get_user_property("user_id"), Some(&json!("X")));
		assert!(store.get_all_session_parameters().is_empty());
		assert!(store.get_all_other().is_empty());
	}

	#[tokio::test]
	async fn save_then_load_roundtrip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("store.json");

		let mut store = PropertyStore::new();
		store.set_user_property("user_id", "BabyYoda2000");
		store.set_user_property("non_personalized_ads", true);
		store.set_session_parameter("session_id", "1700000000");
		store.set_other("note", json!({"nested": [1, 2]}));
		store.save(Some(&path)).await.unwrap();
		assert_eq!(store.data_location(), Some(path.as_path()));

		let loaded = PropertyStore::open(&path).await;
		assert_eq!(loaded.get_all_user_properties(), store.get_all_user_properties());
		assert_eq!(loaded.get_all_session_parameters(), store.get_all_session_parameters());
		assert_eq!(loaded.get_all_other(), store.get_all_other());
		assert_eq!(loaded.data_location(), Some(path.as_path()));
	}

	#[tokio::test]
	async fn save_records_data_location_in_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("store.json");

		let mut store = PropertyStore::new();
		store.save(Some(&path)).await.unwrap();

		let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(raw["data_location"], json!(path.to_str().unwrap()));
	}

	#[tokio::test]
	async fn load_missing_file_creates_empty_document() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("store.json");

		let mut store = PropertyStore::new();
		store.set_user_property("stale", "value");
		store.load(&path).await.unwrap();

		assert!(path.exists());
		assert!(store.get_all_user_properties().is_empty());
		assert!(store.get_all_session_parameters().is_empty());
		assert_eq!(store.data_location(), Some(path.as_path()));

		let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(raw["user_properties"], json!({}));
		assert_eq!(raw["session_parameters"], json!({}));
	}

	#[tokio::test]
	async fn load_malformed_file_falls_back_to_empty() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("store.json");
		std::fs::write(&path, "{ not json").unwrap();

		let mut store = PropertyStore::new();
		store.set_user_property("user_id", "X");
		let result = store.load(&path).await;

		assert!(matches!(result, Err(StoreError::Malformed { .. })));
		assert!(store.get_all_user_properties().is_empty());
		assert_eq!(store.data_location(), Some(path.as_path()));
	}

	#[tokio::test]
	async fn open_never_fails_on_malformed_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("store.json");
		std::fs::write(&path, "[1, 2, 3]").unwrap();

		let store = PropertyStore::open(&path).await;
		assert!(store.get_all_user_properties().is_empty());
	}

	#[tokio::test]
	async fn save_without_location_is_reported() {
		let mut store = PropertyStore::new();
		store.set_user_property("user_id", "X");
		let result = store.save(None).await;
		assert!(matches!(result, Err(StoreError::NoLocation)));
		assert_eq!(store.get_user_property("user_id"), Some(&json!("X")));
	}

	#[tokio::test]
	async fn failed_save_keeps_state_and_location() {
		let dir = tempfile::tempdir().unwrap();
		let good = dir.path().join("store.json");
		let blocker = dir.path().join("blocker");
		std::fs::write(&blocker, "file, not a directory").unwrap();
		let bad = blocker.join("store.json");

		let mut store = PropertyStore::new();
		store.set_user_property("user_id", "X");
		store.save(Some(&good)).await.unwrap();

		let result = store.save(Some(&bad)).await;
		assert!(matches!(result, Err(StoreError::Io { .. })));
		assert_eq!(store.data_location(), Some(good.as_path()));
		assert_eq!(store.get_user_property("user_id"), Some(&json!("X")));
	}

	proptest! {
		#[test]
		fn clear_only_affects_one_category(
			user in proptest::collection::vec("[a-z]{1,8}", 0..10),
			session in proptest::collection::vec("[a-z]{1,8}", 0..10),
		) {
			let mut store = PropertyStore::new();
			for key in &user {
				store.set_user_property(key.clone(), 1);
			}
			for key in &session {
				store.set_session_parameter(key.clone(), 1);
			}
			let sessions_before = store.get_all_session_parameters().clone();

			store.clear(PropertyCategory::User);

			prop_assert!(store.get_all_user_properties().is_empty());
			prop_assert_eq!(store.get_all_session_parameters(), &sessions_before);
		}
	}
}
