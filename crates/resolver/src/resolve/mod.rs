use std::sync::Arc;

use sift_registry::{ServiceObject, ServiceRegistry};
use tracing::debug;

use crate::criteria::{CompiledCriteria, SelectionCriteria};
use crate::error::{ConfigError, ResolveError, Result};
use crate::gateway;
use crate::pipeline::Pipeline;
use crate::requester::{Requester, RequesterId};
use crate::selection::{SelectionMode, Shape, Verdict, decide};
use crate::subscriptions::Subscriptions;


/// One dependency request: what to look up and how to hand it back.
#[derive(Clone)]
pub struct ResolveRequest {
	pub service_type: String,
	pub shape: Shape,
	/// Keep the binding live by notifying the requester on relevant registry events.
	pub track: bool,
	/// An empty scalar result is [`Resolved::Absent`] rather than an error.
	pub optional: bool,
	pub requester: Option<Arc<dyn Requester>>,
}

impl ResolveRequest {
	pub fn scalar(service_type: impl Into<String>) -> Self {
		Self::new(service_type, Shape::Scalar)
	}

	pub fn collection(service_type: impl Into<String>) -> Self {
		Self::new(service_type, Shape::Collection)
	}

	fn new(service_type: impl Into<String>, shape: Shape) -> Self {
		Self {
			service_type: service_type.into(),
			shape,
			track: false,
			optional: false,
			requester: None,
		}
	}

	pub fn requester(mut self, requester: Arc<dyn Requester>) -> Self {
		self.requester = Some(requester);
		self
	}

	pub fn track(mut self, track: bool) -> Self {
		self.track = track;
		self
	}

	pub fn optional(mut self, optional: bool) -> Self {
		self.optional = optional;
		self
	}

	fn describe_requester(&self) -> String {
		self.requester
			.as_ref()
			.map_or_else(|| "<anonymous>".to_string(), |r| r.describe())
	}
}

impl std::fmt::Debug for ResolveRequest {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResolveRequest")
			.field("service_type", &self.service_type)
			.field("shape", &self.shape)
			.field("track", &self.track)
			.field("optional", &self.optional)
			.field("requester", &self.requester.as_ref().map(|r| r.id()))
			.finish()
	}
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
	Absent,
	Single(ServiceObject),
	/// Every match in ranking order; possibly empty.
	Many(Vec<ServiceObject>),
}

impl Resolved {
	pub fn is_absent(&self) -> bool {
		matches!(self, Self::Absent)
	}

	pub fn single(&self) -> Option<&ServiceObject> {
		match self {
			Self::Single(object) => Some(object),
			_ => None,
		}
	}

	pub fn many(&self) -> Option<&[ServiceObject]> {
		match self {
			Self::Many(objects) => Some(objects),
			_ => None,
		}
	}

	/// Flattens any shape into a list: absent is empty, single is one element.
	pub fn into_vec(self) -> Vec<ServiceObject> {
		match self {
			Self::Absent => Vec::new(),
			Self::Single(object) => vec![object],
			Self::Many(objects) => objects,
		}
	}
}

/// Resolves requests against one registry and keeps tracked requesters live.
pub struct Resolver {
	registry: Arc<dyn ServiceRegistry>,
	subscriptions: Arc<Subscriptions>,
}

impl Resolver {
	pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
		let subscriptions = Subscriptions::new(Arc::clone(&registry));
		Self { registry, subscriptions }
	}

	/// Validates `criteria`, then resolves `request` against the registry.
	///
	/// Configuration problems are reported before the registry is touched.
	pub fn resolve(&self, criteria: &SelectionCriteria, request: &ResolveRequest) -> Result<Resolved> {
		let compiled = criteria.compile()?;
		self.resolve_compiled(&compiled, request)
	}

	/// Like [`resolve`](Self::resolve) for criteria compiled ahead of time.
	pub fn resolve_compiled(&self, criteria: &CompiledCriteria, request: &ResolveRequest) -> Result<Resolved> {
		let service_type = request.service_type.as_str();
		if service_type.is_empty() {
			return Err(ConfigError::EmptyServiceType.into());
		}

		if let Some(requester) = &request.requester {
			if request.track {
				self.subscriptions
					.track(requester, service_type, &criteria.tracking_filter(service_type))?;
			} else {
				self.subscriptions.untrack(requester.id());
			}
		}

		let references = gateway::query(self.registry.as_ref(), service_type, criteria)?;
		let pipeline = Pipeline::new(self.registry.as_ref(), criteria);
		let mut candidates = pipeline.run(references)?;
		if request.shape == Shape::Scalar
			&& criteria.mode() == SelectionMode::HighestRankingOrError
			&& candidates.len() > 1
		{
			candidates = pipeline.available(candidates)?;
		}

		let verdict = decide(candidates.len(), request.shape, criteria.mode(), request.optional);
		let resolved = match verdict {
			Verdict::Absent => Resolved::Absent,
			Verdict::NotFound => return Err(not_found(request)),
			Verdict::Ambiguous(count) => {
				return Err(ResolveError::Ambiguous {
					requester: request.describe_requester(),
					service_type: service_type.to_string(),
					count,
				});
			}
			Verdict::Head => match pipeline.head(&candidates)? {
				Some(object) => Resolved::Single(object),
				None if request.optional => Resolved::Absent,
				None => return Err(not_found(request)),
			},
			Verdict::All => Resolved::Many(pipeline.materialize_all(&candidates)?),
		};

		debug!(
			service_type,
			candidates = candidates.len(),
			?verdict,
			tracked = request.track && request.requester.is_some(),
			"resolved"
		);
		Ok(resolved)
	}

	/// Stops live tracking for `id`. Returns `false` if it was not tracked.
	pub fn untrack(&self, id: RequesterId) -> bool {
		self.subscriptions.untrack(id)
	}

	pub fn subscriptions(&self) -> &Subscriptions {
		&self.subscriptions
	}

	pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
		&self.registry
	}
}

fn not_found(request: &ResolveRequest) -> ResolveError {
	debug!(service_type = request.service_type.as_str(), "no candidate");
	ResolveError::NotFound {
		requester: request.describe_requester(),
		service_type: request.service_type.clone(),
	}
}
