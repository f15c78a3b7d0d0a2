use sift_filter::ParseError;
use sift_primitives::{PropertyError, ServiceId};

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	#[error("invalid filter: {0}")]
	InvalidFilter(#[from] ParseError),
	#[error("invalid property: {0}")]
	InvalidProperty(#[from] PropertyError),
	#[error("invalid service type name {0:?}")]
	InvalidTypeName(String),
	#[error("registration provides no service type")]
	NoProvidedTypes,
	#[error("{0} is no longer registered")]
	Unregistered(ServiceId),
	#[error("registry unavailable: {0}")]
	Unavailable(String),
}
