use std::fmt;
use std::str::FromStr;

use super::{Version, VersionError};

/// An interval of versions.
///
/// A bare version `v` denotes `[v, ∞)`. Intervals use `[`/`]` for inclusive and
/// `(`/`)` for exclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
	left: Version,
	left_closed: bool,
	right: Option<Version>,
	right_closed: bool,
}

impl VersionRange {
	/// Range containing every version greater than or equal to `floor`.
	pub fn at_least(floor: Version) -> Self {
		Self {
			left: floor,
			left_closed: true,
			right: None,
			right_closed: false,
		}
	}

	pub fn interval(left: Version, left_closed: bool, right: Version, right_closed: bool) -> Self {
		Self {
			left,
			left_closed,
			right: Some(right),
			right_closed,
		}
	}

	pub fn parse(input: &str) -> Result<Self, VersionError> {
		let trimmed = input.trim();
		let left_closed = match trimmed.chars().next() {
			Some('[') => true,
			Some('(') => false,
			Some(_) => return Version::parse(trimmed).map(Self::at_least),
			None => return Err(VersionError::Empty),
		};

		let invalid = |reason| VersionError::InvalidRange {
			input: input.to_string(),
			reason,
		};

		let right_closed = match trimmed.chars().last() {
			Some(']') if trimmed.len() > 1 => true,
			Some(')') if trimmed.len() > 1 => false,
			_ => return Err(invalid("missing closing ']' or ')'")),
		};

		let inner = &trimmed[1..trimmed.len() - 1];
		let (left, right) = inner.split_once(',').ok_or_else(|| invalid("expected two comma-separated bounds"))?;
		if right.contains(',') {
			return Err(invalid("expected two comma-separated bounds"));
		}

		Ok(Self::interval(Version::parse(left)?, left_closed, Version::parse(right)?, right_closed))
	}

	/// Lower bound.
	pub fn left(&self) -> &Version {
		&self.left
	}

	/// Upper bound; `None` means unbounded.
	pub fn right(&self) -> Option<&Version> {
		self.right.as_ref()
	}

	pub fn includes(&self, version: &Version) -> bool {
		let above_left = if self.left_closed {
			*version >= self.left
		} else {
			*version > self.left
		};
		if !above_left {
			return false;
		}
		match &self.right {
			None => true,
			Some(right) if self.right_closed => version <= right,
			Some(right) => version < right,
		}
	}

	/// Returns true if no version can satisfy the range.
	pub fn is_empty(&self) -> bool {
		match &self.right {
			None => false,
			Some(right) => {
				self.left > *right || (self.left == *right && !(self.left_closed && self.right_closed))
			}
		}
	}
}

impl FromStr for VersionRange {
	type Err = VersionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for VersionRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.right {
			None => write!(f, "{}", self.left),
			Some(right) => write!(
				f,
				"{}{},{}{}",
				if self.left_closed { '[' } else { '(' },
				self.left,
				right,
				if self.right_closed { ']' } else { ')' }
			),
		}
	}
}
