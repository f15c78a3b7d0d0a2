//! Shared fixture for resolver integration tests.
//!
//! The registry holds `OneService` under `IOneService`, and `Run1` / `Run2` under
//! `IMultipleService`, all owned by module `cl.annotation.test` 1.0.0:
//!
//! | service | ranking | properties            | tags             | types   |
//! |---------|---------|-----------------------|------------------|---------|
//! | Run1    | 1       | `p=Run1`, `key=value` | ARun1, ACommon   | IRun1   |
//! | Run2    | 2       | `p=Run2`, `key=value` | ARun2, ACommon   | IRun2   |

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sift_primitives::{ModuleInfo, Version};
use sift_registry::{MemoryRegistry, Registration, ServiceEvent, ServiceObject};
use sift_resolver::{Requester, RequesterId, ResolveError, ResolveRequest, Resolved, Resolver, SelectionCriteria};

pub const IMULTI: &str = "IMultipleService";
pub const IONE: &str = "IOneService";
pub const MODULE: &str = "cl.annotation.test";

/// Value stored behind every fixture registration.
#[derive(Debug, PartialEq, Eq)]
pub struct Run(pub &'static str);

pub fn module() -> ModuleInfo {
	ModuleInfo::new(MODULE, Version::new(1, 0, 0))
}

/// A `Run` registration under `IMultipleService` with `p=<name>` and `key=value`.
pub fn run(name: &'static str, ranking: i64) -> Registration {
	Registration::new(name, Run(name))
		.provides(IMULTI)
		.name(name)
		.ranking(ranking)
		.property("p", name)
		.declare("key:String=value")
		.unwrap()
		.implements(format!("I{name}"))
		.module(module())
}

pub struct Fixture {
	pub registry: MemoryRegistry,
	pub resolver: Arc<Resolver>,
}

pub fn fixture() -> Fixture {
	let _ = tracing_subscriber::fmt::try_init();
	let registry = MemoryRegistry::new();
	registry
		.register(
			Registration::new("OneService", Run("OneService"))
				.provides(IONE)
				.name("OneService")
				.module(module()),
		)
		.unwrap();
	registry
		.register(run("Run1", 1).tag("ARun1").tag("ACommon"))
		.unwrap();
	registry
		.register(run("Run2", 2).tag("ARun2").tag("ACommon"))
		.unwrap();

	let resolver = Arc::new(Resolver::new(Arc::new(registry.clone())));
	Fixture { registry, resolver }
}

impl Fixture {
	pub fn resolve(&self, criteria: SelectionCriteria, request: ResolveRequest) -> Result<Resolved, ResolveError> {
		self.resolver.resolve(&criteria, &request)
	}

	/// Implementation name of a required scalar `IMultipleService`.
	pub fn one(&self, criteria: SelectionCriteria) -> String {
		let resolved = self.resolve(criteria, ResolveRequest::scalar(IMULTI)).unwrap();
		implementation(&resolved)
	}

	/// Implementation name of an optional scalar `IMultipleService`, if any.
	pub fn maybe(&self, criteria: SelectionCriteria) -> Option<String> {
		let resolved = self
			.resolve(criteria, ResolveRequest::scalar(IMULTI).optional(true))
			.unwrap();
		resolved.single().map(|o| o.implementation().to_string())
	}

	pub fn all(&self, criteria: SelectionCriteria) -> Vec<String> {
		names(self.resolve(criteria, ResolveRequest::collection(IMULTI)).unwrap())
	}
}

pub fn implementation(resolved: &Resolved) -> String {
	match resolved.single() {
		Some(object) => object.implementation().to_string(),
		None => panic!("expected a single service, got {resolved:?}"),
	}
}

pub fn names(resolved: Resolved) -> Vec<String> {
	resolved
		.into_vec()
		.iter()
		.map(ServiceObject::implementation)
		.map(str::to_string)
		.collect()
}

/// A host-side consumer that re-injects itself whenever it is notified.
pub struct Consumer {
	id: RequesterId,
	me: Weak<Consumer>,
	resolver: Arc<Resolver>,
	criteria: SelectionCriteria,
	request: ResolveRequest,
	pub valid: AtomicBool,
	injections: Mutex<Vec<Vec<String>>>,
}

impl Consumer {
	pub fn new(resolver: &Arc<Resolver>, criteria: SelectionCriteria, request: ResolveRequest) -> Arc<Self> {
		Arc::new_cyclic(|me| Self {
			id: RequesterId::next(),
			me: me.clone(),
			resolver: Arc::clone(resolver),
			criteria,
			request,
			valid: AtomicBool::new(true),
			injections: Mutex::new(Vec::new()),
		})
	}

	pub fn inject(&self) -> Result<(), ResolveError> {
		let Some(me) = self.me.upgrade() else {
			return Ok(());
		};
		let request = self.request.clone().requester(me);
		let resolved = self.resolver.resolve(&self.criteria, &request)?;
		self.injections.lock().push(names(resolved));
		Ok(())
	}

	/// Every injected value so far, oldest first.
	pub fn injections(&self) -> Vec<Vec<String>> {
		self.injections.lock().clone()
	}

	pub fn current(&self) -> Vec<String> {
		self.injections.lock().last().cloned().unwrap_or_default()
	}

	pub fn dispose(&self) {
		self.valid.store(false, Ordering::SeqCst);
	}
}

impl Requester for Consumer {
	fn id(&self) -> RequesterId {
		self.id
	}

	fn describe(&self) -> String {
		format!("consumer {}", self.id.0)
	}

	fn is_valid(&self) -> bool {
		self.valid.load(Ordering::SeqCst)
	}

	fn notify(&self, event: &ServiceEvent) {
		if let Err(error) = self.inject() {
			tracing::error!(%error, kind = ?event.kind, "re-injection failed");
		}
	}
}
