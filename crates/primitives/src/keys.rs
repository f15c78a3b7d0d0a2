/// Identity name of a registered component. Criteria `names` match against this key.
pub const COMPONENT_NAME: &str = "component.name";

/// Numeric ranking used to order services of the same type; higher wins.
pub const SERVICE_RANKING: &str = "service.ranking";

/// Registration ordinal assigned by the registry.
pub const SERVICE_ID: &str = "service.id";

/// Type identifiers a service is registered under.
pub const OBJECT_CLASS: &str = "objectClass";
