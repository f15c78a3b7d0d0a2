//! Core value types for service resolution: property bags, service and module identities,
//! and versions with interval ranges.

/// Service and module identity types.
pub mod ids;
/// Well-known property keys.
pub mod keys;
/// Case-insensitive property bags and typed property values.
pub mod properties;
/// Module versions and version ranges.
pub mod version;

pub use ids::{ModuleInfo, ServiceId};
pub use properties::{Properties, PropertyError, PropertyValue};
pub use version::{Version, VersionError, VersionRange};
