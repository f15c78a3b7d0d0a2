//! In-memory service registry.
//!
//! # Mental model
//!
//! * Readers load the current [`ServiceTable`] snapshot and never block.
//! * Writers serialize on one mutex, build a replacement snapshot and publish it.
//! * Events are dispatched after publication, with no lock held, on the mutating thread.
//!
//! # Dispatch
//!
//! A mutation delivers one event to every listener whose filter is affected. The listener
//! table is snapshotted when dispatch starts; listeners added during dispatch only see
//! later events, and a listener removed during dispatch is skipped if it has not been
//! invoked yet. Listener callbacks may call back into the registry.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;
use sift_filter::Filter;
use sift_primitives::{ModuleInfo, Properties, PropertyValue, ServiceId, keys};
use tracing::{debug, trace};

use crate::{
	ListenerId, RegistryError, ServiceEvent, ServiceEventKind, ServiceListener, ServiceObject,
	ServiceReference, ServiceRegistry,
};


/// Description of a service to register.
pub struct Registration {
	implementation: String,
	value: Arc<dyn Any + Send + Sync>,
	provides: Vec<String>,
	properties: Properties,
	tags: Vec<String>,
	types: Vec<String>,
	module: Option<ModuleInfo>,
}

impl Registration {
	pub fn new<T: Any + Send + Sync>(implementation: impl Into<String>, value: T) -> Self {
		Self {
			implementation: implementation.into(),
			value: Arc::new(value),
			provides: Vec::new(),
			properties: Properties::new(),
			tags: Vec::new(),
			types: Vec::new(),
			module: None,
		}
	}

	/// Adds a type the service is registered under.
	pub fn provides(mut self, type_name: impl Into<String>) -> Self {
		self.provides.push(type_name.into());
		self
	}

	pub fn property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
		self.properties.insert(key, value);
		self
	}

	/// Adds a `key[:Type]=value` declaration such as `service.ranking:Integer=2`.
	pub fn declare(mut self, declaration: &str) -> Result<Self, RegistryError> {
		self.properties.insert_declaration(declaration)?;
		Ok(self)
	}

	pub fn properties(mut self, properties: Properties) -> Self {
		self.properties.extend(properties.iter().map(|(k, v)| (k.to_string(), v.clone())));
		self
	}

	/// Sets the identity name (`component.name`).
	pub fn name(self, name: impl Into<String>) -> Self {
		self.property(keys::COMPONENT_NAME, name.into())
	}

	pub fn ranking(self, ranking: i64) -> Self {
		self.property(keys::SERVICE_RANKING, ranking)
	}

	/// Adds a capability tag carried by the implementation.
	pub fn tag(mut self, tag: impl Into<String>) -> Self {
		self.tags.push(tag.into());
		self
	}

	/// Adds a type the instance satisfies without being registered under it.
	pub fn implements(mut self, type_name: impl Into<String>) -> Self {
		self.types.push(type_name.into());
		self
	}

	pub fn module(mut self, module: ModuleInfo) -> Self {
		self.module = Some(module);
		self
	}
}

struct Entry {
	reference: ServiceReference,
	object: ServiceObject,
	provides: Vec<String>,
}

/// Immutable published view of the registered services.
#[derive(Default, Clone)]
struct ServiceTable {
	by_id: HashMap<ServiceId, Arc<Entry>>,
	/// Descending ranking, ascending id.
	ranked: Vec<Arc<Entry>>,
}

impl ServiceTable {
	fn with(&self, entry: Arc<Entry>) -> Self {
		let mut by_id = self.by_id.clone();
		by_id.insert(entry.reference.id(), entry);
		Self::from_map(by_id)
	}

	fn without(&self, id: ServiceId) -> Self {
		let mut by_id = self.by_id.clone();
		by_id.remove(&id);
		Self::from_map(by_id)
	}

	fn from_map(by_id: HashMap<ServiceId, Arc<Entry>>) -> Self {
		let mut ranked: Vec<_> = by_id.values().cloned().collect();
		ranked.sort_by(|a, b| a.reference.rank_cmp(&b.reference));
		Self { by_id, ranked }
	}
}

struct ListenerEntry {
	filter: Filter,
	callback: ServiceListener,
}

type ListenerTable = BTreeMap<ListenerId, Arc<ListenerEntry>>;

#[derive(Default)]
struct WriterState {
	last_service: u64,
	last_listener: u64,
}

#[derive(Default)]
struct Shared {
	services: ArcSwap<ServiceTable>,
	listeners: ArcSwap<ListenerTable>,
	writer: Mutex<WriterState>,
}

/// Registry holding services in process memory.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
	shared: Arc<Shared>,
}

impl MemoryRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a service and notifies matching listeners.
	///
	/// # Errors
	///
	/// Fails if the registration provides no type or provides an empty type name.
	pub fn register(&self, registration: Registration) -> Result<ServiceRegistration, RegistryError> {
		if registration.provides.is_empty() {
			return Err(RegistryError::NoProvidedTypes);
		}
		if let Some(bad) = registration.provides.iter().find(|t| t.trim().is_empty()) {
			return Err(RegistryError::InvalidTypeName(bad.clone()));
		}

		let Registration {
			implementation,
			value,
			provides,
			properties,
			tags,
			mut types,
			module,
		} = registration;

		for provided in provides.iter().rev() {
			if !types.contains(provided) {
				types.insert(0, provided.clone());
			}
		}

		let reference = {
			let mut writer = self.shared.writer.lock();
			writer.last_service += 1;
			let id = ServiceId(writer.last_service);
			let reference = ServiceReference::new(id, stamp(properties, id, &provides), module);
			let entry = Entry {
				reference: reference.clone(),
				object: ServiceObject::new(implementation, tags, types, value),
				provides,
			};
			let table = self.shared.services.load();
			self.shared.services.store(Arc::new(table.with(Arc::new(entry))));
			reference
		};

		debug!(service = %reference.id(), ranking = reference.ranking(), "service registered");
		self.shared.dispatch(&reference, |filter| {
			filter.matches(reference.properties()).then_some(ServiceEventKind::Registered)
		});

		Ok(ServiceRegistration {
			shared: Arc::downgrade(&self.shared),
			id: reference.id(),
		})
	}

	/// All registered services in ranked order.
	pub fn services(&self) -> Vec<ServiceReference> {
		self.shared.services.load().ranked.iter().map(|e| e.reference.clone()).collect()
	}

	pub fn len(&self) -> usize {
		self.shared.services.load().by_id.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of active listeners.
	pub fn listener_count(&self) -> usize {
		self.shared.listeners.load().len()
	}
}

impl ServiceRegistry for MemoryRegistry {
	fn query_all(&self, type_name: &str, filter: Option<&str>) -> Result<Vec<ServiceReference>, RegistryError> {
		if type_name.trim().is_empty() {
			return Err(RegistryError::InvalidTypeName(type_name.to_string()));
		}
		let filter = filter.map(sift_filter::parse).transpose()?;

		let table = self.shared.services.load();
		let matches: Vec<_> = table
			.ranked
			.iter()
			.filter(|e| e.provides.iter().any(|p| p == type_name))
			.filter(|e| filter.as_ref().is_none_or(|f| f.matches(e.reference.properties())))
			.map(|e| e.reference.clone())
			.collect();

		trace!(type_name, count = matches.len(), "query");
		Ok(matches)
	}

	fn materialize(&self, reference: &ServiceReference) -> Result<Option<ServiceObject>, RegistryError> {
		Ok(self
			.shared
			.services
			.load()
			.by_id
			.get(&reference.id())
			.map(|e| e.object.clone()))
	}

	fn add_listener(&self, filter: &str, listener: ServiceListener) -> Result<ListenerId, RegistryError> {
		let filter = sift_filter::parse(filter)?;

		let mut writer = self.shared.writer.lock();
		writer.last_listener += 1;
		let id = ListenerId(writer.last_listener);
		let mut table = ListenerTable::clone(&self.shared.listeners.load());
		table.insert(
			id,
			Arc::new(ListenerEntry {
				filter,
				callback: listener,
			}),
		);
		self.shared.listeners.store(Arc::new(table));
		Ok(id)
	}

	fn remove_listener(&self, id: ListenerId) -> bool {
		let _writer = self.shared.writer.lock();
		let current = self.shared.listeners.load_full();
		if !current.contains_key(&id) {
			return false;
		}
		let mut table = ListenerTable::clone(&current);
		table.remove(&id);
		self.shared.listeners.store(Arc::new(table));
		true
	}
}

impl Shared {
	fn modify(&self, id: ServiceId, properties: Properties) -> Result<(), RegistryError> {
		let (old, new) = {
			let _writer = self.writer.lock();
			let table = self.services.load_full();
			let entry = table.by_id.get(&id).ok_or(RegistryError::Unregistered(id))?;
			let new = ServiceReference::new(
				id,
				stamp(properties, id, &entry.provides),
				entry.reference.module().cloned(),
			);
			let replacement = Entry {
				reference: new.clone(),
				object: entry.object.clone(),
				provides: entry.provides.clone(),
			};
			self.services.store(Arc::new(table.with(Arc::new(replacement))));
			(entry.reference.clone(), new)
		};

		debug!(service = %id, ranking = new.ranking(), "service modified");
		self.dispatch(&new, |filter| {
			if filter.matches(new.properties()) {
				Some(ServiceEventKind::Modified)
			} else if filter.matches(old.properties()) {
				Some(ServiceEventKind::ModifiedEndMatch)
			} else {
				None
			}
		});
		Ok(())
	}

	fn unregister(&self, id: ServiceId) -> Result<(), RegistryError> {
		let reference = {
			let _writer = self.writer.lock();
			let table = self.services.load_full();
			let entry = table.by_id.get(&id).ok_or(RegistryError::Unregistered(id))?;
			self.services.store(Arc::new(table.without(id)));
			entry.reference.clone()
		};

		debug!(service = %id, "service unregistered");
		self.dispatch(&reference, |filter| {
			filter.matches(reference.properties()).then_some(ServiceEventKind::Unregistering)
		});
		Ok(())
	}

	fn dispatch(&self, reference: &ServiceReference, kind_for: impl Fn(&Filter) -> Option<ServiceEventKind>) {
		let listeners = self.listeners.load_full();
		for (id, listener) in listeners.iter() {
			let Some(kind) = kind_for(&listener.filter) else {
				continue;
			};
			if !self.listeners.load().contains_key(id) {
				trace!(listener = id.0, "listener removed during dispatch; skipped");
				continue;
			}
			trace!(listener = id.0, service = %reference.id(), ?kind, "dispatching service event");
			let event = ServiceEvent {
				kind,
				reference: reference.clone(),
			};
			(listener.callback)(&event);
		}
	}
}

/// Overwrites the registry-owned properties: `service.id` and `objectClass`.
fn stamp(mut properties: Properties, id: ServiceId, provides: &[String]) -> Properties {
	properties.insert(keys::SERVICE_ID, i64::try_from(id.as_u64()).unwrap_or(i64::MAX));
	properties.insert(keys::OBJECT_CLASS, provides.to_vec());
	properties
}

/// Handle to a registered service.
///
/// Dropping the handle leaves the service registered.
#[derive(Debug)]
pub struct ServiceRegistration {
	shared: Weak<Shared>,
	id: ServiceId,
}

impl ServiceRegistration {
	pub fn id(&self) -> ServiceId {
		self.id
	}

	/// Current reference, or `None` once unregistered.
	pub fn reference(&self) -> Option<ServiceReference> {
		let shared = self.shared.upgrade()?;
		let table = shared.services.load();
		table.by_id.get(&self.id).map(|e| e.reference.clone())
	}

	/// Replaces the service properties and notifies listeners.
	///
	/// `service.id` and `objectClass` are owned by the registry and cannot be changed.
	pub fn set_properties(&self, properties: Properties) -> Result<(), RegistryError> {
		self.upgrade()?.modify(self.id, properties)
	}

	/// Removes the service and notifies listeners.
	pub fn unregister(self) -> Result<(), RegistryError> {
		self.upgrade()?.unregister(self.id)
	}

	fn upgrade(&self) -> Result<Arc<Shared>, RegistryError> {
		self.shared
			.upgrade()
			.ok_or_else(|| RegistryError::Unavailable("registry dropped".to_string()))
	}
}
