use sift_filter::ParseError;
use sift_primitives::VersionError;
use sift_registry::RegistryError;

/// Criteria that can never resolve, or a registry that refused the request.
///
/// Raised before the registry is queried whenever the problem is detectable locally.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid module version range {range:?}: {source}")]
	InvalidVersionRange {
		range: String,
		#[source]
		source: VersionError,
	},
	#[error("{ranges} module version ranges given for {patterns} module name patterns; expected 0, 1 or {patterns}")]
	RangeCardinality { patterns: usize, ranges: usize },
	#[error("invalid module name pattern {pattern:?}: {reason}")]
	InvalidModulePattern { pattern: String, reason: String },
	#[error("invalid filter {filter:?}: {source}")]
	InvalidFilter {
		filter: String,
		#[source]
		source: ParseError,
	},
	#[error("service type name is empty")]
	EmptyServiceType,
	#[error("registry call failed: {0}")]
	Registry(#[from] RegistryError),
	#[error("invalid criteria configuration: {0}")]
	Toml(#[from] toml::de::Error),
}

/// Errors returned by [`Resolver::resolve`](crate::Resolver::resolve).
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
	#[error(transparent)]
	Configuration(#[from] ConfigError),
	#[error("no {service_type} service matches the criteria of {requester}")]
	NotFound { requester: String, service_type: String },
	#[error("{count} {service_type} services match the criteria of {requester}; expected exactly one")]
	Ambiguous {
		requester: String,
		service_type: String,
		count: usize,
	},
}

pub type Result<T> = std::result::Result<T, ResolveError>;
