use std::fmt;

use crate::Version;

/// Registration ordinal of a service.
///
/// Assigned by the registry in ascending order, so it doubles as the tie-breaker between
/// services of equal ranking (lower id was registered first and wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceId(pub u64);

impl ServiceId {
	pub const fn as_u64(self) -> u64 {
		self.0
	}
}

impl fmt::Display for ServiceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "service#{}", self.0)
	}
}

/// Identity and version of the deployable unit that owns a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleInfo {
	pub name: String,
	pub version: Version,
}

impl ModuleInfo {
	pub fn new(name: impl Into<String>, version: Version) -> Self {
		Self {
			name: name.into(),
			version,
		}
	}
}

impl fmt::Display for ModuleInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{}", self.name, self.version)
	}
}
