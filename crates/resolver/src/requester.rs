use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use sift_registry::ServiceEvent;

/// Stable identity of a requester across resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequesterId(pub u64);

impl RequesterId {
	/// Allocates a process-unique id.
	pub fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for RequesterId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "requester#{}", self.0)
	}
}

/// The consumer a resolution is performed for.
///
/// Tracked requesters are held weakly; once the last strong reference is gone, or
/// [`is_valid`](Requester::is_valid) returns `false`, notifications are discarded.
pub trait Requester: Send + Sync {
	fn id(&self) -> RequesterId;

	/// Human-readable identity used in error messages.
	fn describe(&self) -> String {
		self.id().to_string()
	}

	/// Whether the requester still wants notifications.
	fn is_valid(&self) -> bool {
		true
	}

	/// Called on the registry's event thread when the tracked service set may have
	/// changed. Implementations typically resolve again.
	///
	/// No resolver lock is held during the call, so it may re-enter the resolver.
	fn notify(&self, event: &ServiceEvent);
}
