// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch splitting and the postponed-event queue.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use ga4mp_core::Event;
use tracing::debug;

/// Splits `items` into contiguous chunks of at most `max_size`, preserving order.
///
/// Empty input yields no batches. A `max_size` of zero is treated as one.
pub fn split_into_batches<T>(items: Vec<T>, max_size: usize) -> Vec<Vec<T>> {
	let max_size = max_size.max(1);
	let mut batches = Vec::with_capacity(items.len().div_ceil(max_size));
	let mut iter = items.into_iter().peekable();

	while iter.peek().is_some() {
		batches.push(iter.by_ref().take(max_size).collect());
	}

	batches
}

/// An event waiting in the postponed queue with its capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
	pub event: Event,
	/// Capture time in microseconds since the Unix epoch.
	pub timestamp_micros: i64,
}

impl QueuedEvent {
	pub fn new(event: Event, captured_at: DateTime<Utc>) -> Self {
		Self {
			event,
			timestamp_micros: captured_at.timestamp_micros(),
		}
	}
}

/// FIFO queue of events captured for later dispatch.
#[derive(Debug, Default)]
pub struct PostponedQueue {
	events: VecDeque<QueuedEvent>,
}

impl PostponedQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `events`, all stamped with `captured_at`.
	pub fn enqueue_at(&mut self, events: impl IntoIterator<Item = Event>, captured_at: DateTime<Utc>) {
		let before = self.events.len();
		self
			.events
			.extend(events.into_iter().map(|event| QueuedEvent::new(event, captured_at)));
		debug!(
			added = self.events.len() - before,
			queued = self.events.len(),
			"Postponed events queued"
		);
	}

	/// Appends `events` stamped with the current time.
	pub fn enqueue(&mut self, events: impl IntoIterator<Item = Event>) {
		self.enqueue_at(events, Utc::now());
	}

	/// Drops up to `count` events from the front of the queue.
	pub fn remove_front(&mut self, count: usize) {
		let count = count.min(self.events.len());
		self.events.drain(..count);
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &QueuedEvent> {
		self.events.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use proptest::prelude::*;

	fn event(n: usize) -> Event {
		Event::new(format!("event_{n}")).unwrap()
	}

	#[test]
	fn twenty_six_events_make_two_batches() {
		let batches = split_into_batches((0..26).collect::<Vec<_>>(), 25);
		let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
		assert_eq!(sizes, vec![25, 1]);
	}

	#[test]
	fn empty_input_makes_no_batches() {
		let batches = split_into_batches(Vec::<u8>::new(), 25);
		assert!(batches.is_empty());
	}

	#[test]
	fn exact_multiple_has_no_short_tail() {
		let batches = split_into_batches((0..50).collect::<Vec<_>>(), 25);
		assert_eq!(batches.len(), 2);
		assert!(batches.iter().all(|b| b.len() == 25));
	}

	#[test]
	fn zero_max_size_is_treated_as_one() {
		let batches = split_into_batches(vec![1, 2, 3], 0);
		assert_eq!(batches, vec![vec![1], vec![2], vec![3]]);
	}

	#[test]
	fn queue_stamps_capture_time() {
		let captured = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
		let mut queue = PostponedQueue::new();
		queue.enqueue_at(vec![event(0), event(1)], captured);

		assert_eq!(queue.len(), 2);
		assert!(queue
			.iter()
			.all(|q| q.timestamp_micros == captured.timestamp_micros()));
	}

	#[test]
	fn iteration_is_fifo_across_enqueues() {
		let mut queue = PostponedQueue::new();
		queue.enqueue(vec![event(0), event(1)]);
		queue.enqueue(vec![event(2)]);

		let names: Vec<&str> = queue.iter().map(|q| q.event.name()).collect();
		assert_eq!(names, vec!["event_0", "event_1", "event_2"]);
	}

	#[test]
	fn remove_front_keeps_remaining_order() {
		let mut queue = PostponedQueue::new();
		queue.enqueue(vec![event(0), event(1), event(2)]);

		queue.remove_front(1);
		queue.enqueue(vec![event(3)]);

		let names: Vec<String> = queue.iter().map(|q| q.event.name().to_string()).collect();
		assert_eq!(names, vec!["event_1", "event_2", "event_3"]);

		queue.remove_front(10);
		assert!(queue.is_empty());
	}

	proptest! {
		#[test]
		fn splitting_preserves_size_and_order(len in 0usize..200, max in 1usize..=25) {
			let items: Vec<usize> = (0..len).collect();
			let batches = split_into_batches(items.clone(), max);

			prop_assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= max));
			prop_assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), len);
			prop_assert_eq!(batches.concat(), items);
		}

		#[test]
		fn only_last_batch_may_be_short(len in 1usize..200, max in 1usize..=25) {
			let batches = split_into_batches((0..len).collect::<Vec<_>>(), max);
			let (last, full) = batches.split_last().unwrap();
			prop_assert!(full.iter().all(|b| b.len() == max));
			prop_assert!(!last.is_empty());
		}
	}
}
