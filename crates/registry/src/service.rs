use std::any::Any;
use std::fmt;
use std::sync::Arc;

use sift_primitives::{ModuleInfo, Properties, ServiceId};

/// Snapshot of a registration: identity, properties and owning module.
///
/// Cheap to clone. Two references are equal when they name the same registration, even if
/// one of them carries older properties.
#[derive(Clone)]
pub struct ServiceReference {
	inner: Arc<ReferenceInner>,
}

struct ReferenceInner {
	id: ServiceId,
	properties: Properties,
	module: Option<ModuleInfo>,
}

impl ServiceReference {
	pub fn new(id: ServiceId, properties: Properties, module: Option<ModuleInfo>) -> Self {
		Self {
			inner: Arc::new(ReferenceInner { id, properties, module }),
		}
	}

	pub fn id(&self) -> ServiceId {
		self.inner.id
	}

	pub fn properties(&self) -> &Properties {
		&self.inner.properties
	}

	/// Owning module, if the registry can resolve one.
	pub fn module(&self) -> Option<&ModuleInfo> {
		self.inner.module.as_ref()
	}

	pub fn ranking(&self) -> i64 {
		self.inner.properties.ranking()
	}

	/// Ordering used by ranked queries: higher ranking first, then lower id.
	pub fn rank_cmp(&self, other: &Self) -> std::cmp::Ordering {
		other.ranking().cmp(&self.ranking()).then_with(|| self.id().cmp(&other.id()))
	}
}

impl PartialEq for ServiceReference {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for ServiceReference {}

impl fmt::Debug for ServiceReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServiceReference")
			.field("id", &self.inner.id)
			.field("ranking", &self.ranking())
			.field("module", &self.inner.module)
			.finish_non_exhaustive()
	}
}

/// A materialized service instance with its capability metadata.
///
/// Cheap to clone; equality is identity of the underlying instance.
#[derive(Clone)]
pub struct ServiceObject {
	inner: Arc<ObjectInner>,
}

struct ObjectInner {
	implementation: String,
	tags: Vec<String>,
	types: Vec<String>,
	value: Arc<dyn Any + Send + Sync>,
}

impl ServiceObject {
	pub fn new(
		implementation: impl Into<String>,
		tags: Vec<String>,
		types: Vec<String>,
		value: Arc<dyn Any + Send + Sync>,
	) -> Self {
		Self {
			inner: Arc::new(ObjectInner {
				implementation: implementation.into(),
				tags,
				types,
				value,
			}),
		}
	}

	/// Identifier of the concrete implementation.
	pub fn implementation(&self) -> &str {
		&self.inner.implementation
	}

	/// Capability tags carried by the implementation.
	pub fn tags(&self) -> &[String] {
		&self.inner.tags
	}

	/// Type identifiers the instance satisfies.
	pub fn types(&self) -> &[String] {
		&self.inner.types
	}

	pub fn has_tag(&self, tag: &str) -> bool {
		self.inner.tags.iter().any(|t| t == tag)
	}

	pub fn implements(&self, type_name: &str) -> bool {
		self.inner.types.iter().any(|t| t == type_name)
	}

	pub fn value(&self) -> &Arc<dyn Any + Send + Sync> {
		&self.inner.value
	}

	pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		Arc::clone(&self.inner.value).downcast::<T>().ok()
	}
}

impl PartialEq for ServiceObject {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for ServiceObject {}

impl fmt::Debug for ServiceObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServiceObject")
			.field("implementation", &self.inner.implementation)
			.field("tags", &self.inner.tags)
			.field("types", &self.inner.types)
			.finish_non_exhaustive()
	}
}

/// What happened to a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceEventKind {
	Registered,
	/// Properties changed and the service still matches the listener's filter.
	Modified,
	/// Properties changed and the service no longer matches the listener's filter.
	ModifiedEndMatch,
	/// The service was removed. The event carries its last reference.
	Unregistering,
}

/// A registry change delivered to listeners.
#[derive(Debug, Clone)]
pub struct ServiceEvent {
	pub kind: ServiceEventKind,
	pub reference: ServiceReference,
}
