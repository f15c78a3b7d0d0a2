//! Module versions and version ranges.
//!
//! # Syntax
//!
//! ```text
//! version   = major ( "." minor ( "." micro ( "." qualifier )? )? )?
//! qualifier = 1*( ALPHA | DIGIT | "_" | "-" )
//! range     = version                                  ; at least `version`
//!           | ( "[" | "(" ) version "," version ( "]" | ")" )
//! ```
//!
//! Missing numeric components default to zero, so `"1"` and `"1.0.0"` are the same version.
//! Ordering is numeric on `major`, `minor`, `micro`, then lexicographic on the qualifier,
//! with an empty qualifier sorting first.

use std::fmt;
use std::str::FromStr;

mod range;

pub use range::VersionRange;


/// Errors raised while parsing versions and version ranges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
	#[error("empty version")]
	Empty,
	#[error("invalid version component {component:?} in {input:?}")]
	InvalidComponent { input: String, component: String },
	#[error("invalid version qualifier {qualifier:?} in {input:?}")]
	InvalidQualifier { input: String, qualifier: String },
	#[error("malformed version range {input:?}: {reason}")]
	InvalidRange { input: String, reason: &'static str },
}

/// A module version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
	major: u64,
	minor: u64,
	micro: u64,
	qualifier: String,
}

impl Version {
	pub const fn new(major: u64, minor: u64, micro: u64) -> Self {
		Self {
			major,
			minor,
			micro,
			qualifier: String::new(),
		}
	}

	pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
		self.qualifier = qualifier.into();
		self
	}

	pub fn major(&self) -> u64 {
		self.major
	}

	pub fn minor(&self) -> u64 {
		self.minor
	}

	pub fn micro(&self) -> u64 {
		self.micro
	}

	pub fn qualifier(&self) -> &str {
		&self.qualifier
	}

	/// Parses a version string. Surrounding whitespace is ignored.
	pub fn parse(input: &str) -> Result<Self, VersionError> {
		let trimmed = input.trim();
		if trimmed.is_empty() {
			return Err(VersionError::Empty);
		}

		let mut parts = trimmed.splitn(4, '.');
		let mut numeric = [0u64; 3];
		for slot in &mut numeric {
			let Some(component) = parts.next() else {
				break;
			};
			*slot = parse_component(input, component)?;
		}

		let qualifier = parts.next().unwrap_or_default();
		if !qualifier.is_empty() || trimmed.ends_with('.') {
			let valid = !qualifier.is_empty()
				&& qualifier
					.chars()
					.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
			if !valid {
				return Err(VersionError::InvalidQualifier {
					input: input.to_string(),
					qualifier: qualifier.to_string(),
				});
			}
		}

		Ok(Self {
			major: numeric[0],
			minor: numeric[1],
			micro: numeric[2],
			qualifier: qualifier.to_string(),
		})
	}
}

fn parse_component(input: &str, component: &str) -> Result<u64, VersionError> {
	if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
		return Err(VersionError::InvalidComponent {
			input: input.to_string(),
			component: component.to_string(),
		});
	}
	component.parse::<u64>().map_err(|_| VersionError::InvalidComponent {
		input: input.to_string(),
		component: component.to_string(),
	})
}

impl FromStr for Version {
	type Err = VersionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
		if !self.qualifier.is_empty() {
			write!(f, ".{}", self.qualifier)?;
		}
		Ok(())
	}
}
