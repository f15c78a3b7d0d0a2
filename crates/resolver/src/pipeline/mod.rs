//! Candidate post-filters.
//!
//! Stages run in a fixed order over the ranked query result and only ever remove
//! candidates, so the survivors keep registry order:
//!
//! 1. owning module name and version range,
//! 2. required and excluded capability tags,
//! 3. required and excluded types.
//!
//! Instances are materialized lazily, at most once per candidate. A candidate whose
//! service disappeared before materialization is dropped.

use std::cell::OnceCell;

use sift_registry::{ServiceObject, ServiceReference, ServiceRegistry};
use tracing::{debug, trace};

use crate::criteria::CompiledCriteria;
use crate::error::ConfigError;


/// A query result moving through the pipeline.
pub struct Candidate {
	reference: ServiceReference,
	object: OnceCell<Option<ServiceObject>>,
}

impl Candidate {
	pub fn new(reference: ServiceReference) -> Self {
		Self {
			reference,
			object: OnceCell::new(),
		}
	}

	pub fn reference(&self) -> &ServiceReference {
		&self.reference
	}

	/// Materializes the instance on first use; `None` if the service is gone.
	pub fn object(&self, registry: &dyn ServiceRegistry) -> Result<Option<&ServiceObject>, ConfigError> {
		if self.object.get().is_none() {
			let materialized = registry.materialize(&self.reference)?;
			let _ = self.object.set(materialized);
		}
		Ok(self.object.get().and_then(Option::as_ref))
	}

	#[cfg(test)]
	pub(crate) fn is_materialized(&self) -> bool {
		self.object.get().is_some()
	}
}

/// Post-filters for one compiled criteria against one registry.
pub struct Pipeline<'a> {
	registry: &'a dyn ServiceRegistry,
	criteria: &'a CompiledCriteria,
}

impl<'a> Pipeline<'a> {
	pub fn new(registry: &'a dyn ServiceRegistry, criteria: &'a CompiledCriteria) -> Self {
		Self { registry, criteria }
	}

	pub fn run(&self, references: Vec<ServiceReference>) -> Result<Vec<Candidate>, ConfigError> {
		let mut candidates: Vec<Candidate> = references.into_iter().map(Candidate::new).collect();
		let criteria = self.criteria;

		if let Some(modules) = criteria.modules() {
			self.retain(&mut candidates, "module", |c| {
				Ok(modules.admits(c.reference().module()) && c.object(self.registry)?.is_some())
			})?;
		}

		let (required, excluded) = (criteria.required_tags(), criteria.excluded_tags());
		if !required.is_empty() || !excluded.is_empty() {
			self.retain(&mut candidates, "tags", |c| {
				Ok(c.object(self.registry)?.is_some_and(|o| {
					required.iter().all(|t| o.has_tag(t)) && !excluded.iter().any(|t| o.has_tag(t))
				}))
			})?;
		}

		let (required, excluded) = (criteria.required_types(), criteria.excluded_types());
		if !required.is_empty() || !excluded.is_empty() {
			self.retain(&mut candidates, "types", |c| {
				Ok(c.object(self.registry)?.is_some_and(|o| {
					required.iter().all(|t| o.implements(t)) && !excluded.iter().any(|t| o.implements(t))
				}))
			})?;
		}

		Ok(candidates)
	}

	/// Materializes every candidate and drops those whose service is gone.
	pub fn available(&self, mut candidates: Vec<Candidate>) -> Result<Vec<Candidate>, ConfigError> {
		self.retain(&mut candidates, "available", |c| Ok(c.object(self.registry)?.is_some()))?;
		Ok(candidates)
	}

	/// First candidate whose instance is still available.
	pub fn head(&self, candidates: &[Candidate]) -> Result<Option<ServiceObject>, ConfigError> {
		for candidate in candidates {
			if let Some(object) = candidate.object(self.registry)? {
				return Ok(Some(object.clone()));
			}
		}
		Ok(None)
	}

	/// Every available instance, in candidate order.
	pub fn materialize_all(&self, candidates: &[Candidate]) -> Result<Vec<ServiceObject>, ConfigError> {
		let mut objects = Vec::with_capacity(candidates.len());
		for candidate in candidates {
			if let Some(object) = candidate.object(self.registry)? {
				objects.push(object.clone());
			}
		}
		Ok(objects)
	}

	fn retain<F>(&self, candidates: &mut Vec<Candidate>, stage: &'static str, mut keep: F) -> Result<(), ConfigError>
	where
		F: FnMut(&Candidate) -> Result<bool, ConfigError>,
	{
		let before = candidates.len();
		let mut kept = Vec::with_capacity(before);
		for candidate in candidates.drain(..) {
			if keep(&candidate)? {
				kept.push(candidate);
			} else {
				trace!(stage, service = %candidate.reference().id(), "candidate dropped");
			}
		}
		*candidates = kept;
		debug!(stage, before, after = candidates.len(), "pipeline stage");
		Ok(())
	}
}
