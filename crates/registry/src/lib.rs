//! Service registry contract.
//!
//! The resolver consumes registries through [`ServiceRegistry`]: ranked queries, instance
//! materialization, and filtered change listeners. [`MemoryRegistry`] is an in-process
//! implementation with snapshot reads and synchronous event delivery.

/// Registry failures.
pub mod error;
/// In-memory registry with atomically published snapshots.
pub mod memory;
/// References, materialized objects and change events.
pub mod service;

use std::sync::Arc;

pub use error::RegistryError;
pub use memory::{MemoryRegistry, Registration, ServiceRegistration};
pub use service::{ServiceEvent, ServiceEventKind, ServiceObject, ServiceReference};

/// Handle returned by [`ServiceRegistry::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Callback invoked for every change event matching a listener's filter.
pub type ServiceListener = Arc<dyn Fn(&ServiceEvent) + Send + Sync>;

/// Query and event contract of a live service registry.
pub trait ServiceRegistry: Send + Sync {
	/// Returns references provided under `type_name` that match `filter`.
	///
	/// Results are ordered by descending ranking, ties broken by ascending registration
	/// order.
	fn query_all(&self, type_name: &str, filter: Option<&str>) -> Result<Vec<ServiceReference>, RegistryError>;

	/// Returns the instance behind `reference`, or `None` if it was unregistered.
	///
	/// Repeated calls for the same live reference return the same instance.
	fn materialize(&self, reference: &ServiceReference) -> Result<Option<ServiceObject>, RegistryError>;

	/// Registers `listener` for events on services matching `filter`.
	///
	/// Neither this nor [`remove_listener`](Self::remove_listener) may invoke listeners
	/// before returning; callers may hold their own bookkeeping locks across both.
	fn add_listener(&self, filter: &str, listener: ServiceListener) -> Result<ListenerId, RegistryError>;

	/// Removes a listener. Returns `false` if the handle was unknown.
	fn remove_listener(&self, id: ListenerId) -> bool;
}
