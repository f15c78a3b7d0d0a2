use sift_registry::{ServiceReference, ServiceRegistry};
use tracing::{debug, trace};

use crate::criteria::CompiledCriteria;
use crate::error::ConfigError;

/// Queries the registry for `service_type` under the composed filter, then applies the
/// custom predicate to the raw references. Registry order is preserved.
pub(crate) fn query(
	registry: &dyn ServiceRegistry,
	service_type: &str,
	criteria: &CompiledCriteria,
) -> Result<Vec<ServiceReference>, ConfigError> {
	let mut references = registry.query_all(service_type, criteria.filter())?;
	let queried = references.len();

	if criteria.has_predicate() {
		references.retain(|reference| {
			let keep = criteria.admits(reference);
			if !keep {
				trace!(service = %reference.id(), "rejected by custom predicate");
			}
			keep
		});
	}

	debug!(
		service_type,
		filter = criteria.filter().unwrap_or(""),
		queried,
		admitted = references.len(),
		"registry query"
	);
	Ok(references)
}
