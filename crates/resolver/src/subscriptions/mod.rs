//! Per-requester change listeners.
//!
//! Each tracked requester owns exactly one registry listener. Re-tracking swaps the
//! listener in place; untracking removes it. Every listener is stamped with a generation,
//! and a callback whose generation is no longer current is discarded, so a replaced or
//! removed listener can never notify again even if the registry is mid-dispatch.
//!
//! A requester's entry stays locked for the whole swap, including the registry's
//! listener add and remove calls, and bucket membership changes under the same lock.
//! No entry is locked across queries or requester callbacks, so requesters may re-enter
//! [`Subscriptions::track`] from [`Requester::notify`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sift_registry::{ListenerId, RegistryError, ServiceEvent, ServiceRegistry};
use tracing::{debug, trace, warn};

use crate::error::ConfigError;
use crate::requester::{Requester, RequesterId};


struct Subscription {
	listener: ListenerId,
	generation: u64,
	service_type: String,
	requester: Weak<dyn Requester>,
}

/// Tracked requesters and their registry listeners.
pub struct Subscriptions {
	registry: Arc<dyn ServiceRegistry>,
	entries: DashMap<RequesterId, Subscription>,
	/// Requesters by desired service type.
	buckets: DashMap<String, HashSet<RequesterId>>,
	generation: AtomicU64,
}

impl Subscriptions {
	pub fn new(registry: Arc<dyn ServiceRegistry>) -> Arc<Self> {
		Arc::new(Self {
			registry,
			entries: DashMap::new(),
			buckets: DashMap::new(),
			generation: AtomicU64::new(0),
		})
	}

	/// Starts or replaces tracking for `requester`.
	///
	/// `filter` is the listener expression, normally
	/// [`CompiledCriteria::tracking_filter`](crate::CompiledCriteria::tracking_filter).
	/// It is validated before the current subscription is touched, so a rejected filter
	/// leaves an existing subscription in place.
	///
	/// A re-track swaps the listener while the requester's entry is held: the old handle
	/// is removed before the new one is added, so the registry never holds two listeners
	/// for one requester. Events arriving during the swap are covered by the query the
	/// resolver runs after tracking.
	pub fn track(
		self: &Arc<Self>,
		requester: &Arc<dyn Requester>,
		service_type: &str,
		filter: &str,
	) -> Result<(), ConfigError> {
		sift_filter::parse(filter).map_err(|source| ConfigError::InvalidFilter {
			filter: filter.to_string(),
			source,
		})?;

		let id = requester.id();
		let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
		let subscription = |listener| Subscription {
			listener,
			generation,
			service_type: service_type.to_string(),
			requester: Arc::downgrade(requester),
		};

		match self.entries.entry(id) {
			Entry::Occupied(mut occupied) => {
				let previous = occupied.get().service_type.clone();
				self.remove_listener(id, occupied.get().listener);
				let listener = match self.add_listener(id, generation, filter) {
					Ok(listener) => listener,
					Err(err) => {
						self.leave_bucket(&previous, id);
						occupied.remove();
						warn!(requester = %id, error = %err, "re-tracking failed; requester untracked");
						return Err(err.into());
					}
				};
				*occupied.get_mut() = subscription(listener);
				if previous != service_type {
					self.leave_bucket(&previous, id);
					self.join_bucket(service_type, id);
				}
				debug!(requester = %id, generation, service_type, "tracking replaced");
			}
			Entry::Vacant(vacant) => {
				let listener = self.add_listener(id, generation, filter)?;
				vacant.insert(subscription(listener));
				self.join_bucket(service_type, id);
				debug!(requester = %id, generation, service_type, "tracking started");
			}
		}
		Ok(())
	}

	/// Stops tracking. Returns `false` if the requester was not tracked.
	pub fn untrack(&self, id: RequesterId) -> bool {
		let Entry::Occupied(occupied) = self.entries.entry(id) else {
			return false;
		};
		self.remove_listener(id, occupied.get().listener);
		self.leave_bucket(&occupied.get().service_type, id);
		let subscription = occupied.remove();
		debug!(requester = %id, service_type = subscription.service_type.as_str(), "tracking stopped");
		true
	}

	pub fn is_tracked(&self, id: RequesterId) -> bool {
		self.entries.contains_key(&id)
	}

	/// Number of tracked requesters, which equals the number of live listeners.
	pub fn tracked_count(&self) -> usize {
		self.entries.len()
	}

	/// Listener currently registered for `id`.
	pub fn listener_of(&self, id: RequesterId) -> Option<ListenerId> {
		self.entries.get(&id).map(|s| s.listener)
	}

	/// Number of distinct service types with at least one tracked requester.
	pub fn bucket_count(&self) -> usize {
		self.buckets.len()
	}

	/// Tracked requesters that asked for `service_type`, in id order.
	pub fn requesters_for(&self, service_type: &str) -> Vec<RequesterId> {
		let mut ids: Vec<_> = self
			.buckets
			.get(service_type)
			.map(|set| set.iter().copied().collect())
			.unwrap_or_default();
		ids.sort();
		ids
	}

	fn deliver(&self, id: RequesterId, generation: u64, event: &ServiceEvent) {
		let requester = match self.entries.get(&id) {
			Some(current) if current.generation == generation => current.requester.upgrade(),
			_ => {
				debug!(requester = %id, generation, "stale notification discarded");
				return;
			}
		};

		let Some(requester) = requester.filter(|r| r.is_valid()) else {
			debug!(requester = %id, "notification for disposed requester discarded");
			return;
		};

		trace!(requester = %id, kind = ?event.kind, service = %event.reference.id(), "notifying requester");
		requester.notify(event);
	}

	fn add_listener(self: &Arc<Self>, id: RequesterId, generation: u64, filter: &str) -> Result<ListenerId, RegistryError> {
		let manager = Arc::downgrade(self);
		self.registry.add_listener(
			filter,
			Arc::new(move |event: &ServiceEvent| {
				if let Some(manager) = manager.upgrade() {
					manager.deliver(id, generation, event);
				}
			}),
		)
	}

	fn remove_listener(&self, id: RequesterId, listener: ListenerId) {
		if !self.registry.remove_listener(listener) {
			warn!(requester = %id, listener = listener.0, "registry did not know listener");
		}
	}

	fn join_bucket(&self, service_type: &str, id: RequesterId) {
		self.buckets.entry(service_type.to_string()).or_default().insert(id);
	}

	fn leave_bucket(&self, service_type: &str, id: RequesterId) {
		if let Entry::Occupied(mut bucket) = self.buckets.entry(service_type.to_string()) {
			bucket.get_mut().remove(&id);
			if bucket.get().is_empty() {
				bucket.remove();
			}
		}
	}
}
