// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for event construction and structural validation.

use thiserror::Error;

/// Structural problems with a raw JSON event list.
///
/// These indicate a programming error on the caller's side, never a
/// data-quality issue, and are always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
	#[error("events should be a list")]
	NotAList,

	#[error("each event should be an object (event {index} is not)")]
	EventNotAnObject { index: usize },

	#[error("each event should have a \"name\" key (event {index} has none)")]
	MissingName { index: usize },

	#[error("event {index} has a \"name\" that is not a string")]
	NameNotAString { index: usize },

	#[error("each event should have a \"params\" key (event {index} has none)")]
	MissingParams { index: usize },

	#[error("event {index} has \"params\" that is not an object")]
	ParamsNotAnObject { index: usize },
}

/// Errors raised while building events and items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
	#[error("event name cannot exceed {max} characters: {name}")]
	EventNameTooLong { name: String, max: usize },

	#[error("parameter name cannot exceed {max} characters: {name}")]
	ParamNameTooLong { name: String, max: usize },

	#[error("value of parameter {name} cannot exceed {max} characters")]
	ParamValueTooLong { name: String, max: usize },

	#[error("event cannot contain more than {max} parameters")]
	TooManyParams { max: usize },

	#[error("parameter {name} holds a list; only \"items\" may be list-valued")]
	UnexpectedList { name: String },

	#[error("parameter \"items\" must be a list of items")]
	ItemsNotAList,

	#[error("invalid item: {0}")]
	InvalidItem(String),

	#[error(transparent)]
	Structure(#[from] StructureError),
}

/// A specialized `Result` type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
