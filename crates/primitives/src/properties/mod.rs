//! Service property bags.
//!
//! Keys are matched case-insensitively while preserving the spelling they were inserted
//! with. Bags are small (a handful of entries per service), so entries live in a vector
//! in insertion order.

use std::fmt;

use crate::keys;


/// A single property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
	String(String),
	Long(i64),
	Bool(bool),
	List(Vec<PropertyValue>),
}

impl PropertyValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_long(&self) -> Option<i64> {
		match self {
			Self::Long(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[PropertyValue]> {
		match self {
			Self::List(items) => Some(items),
			_ => None,
		}
	}

	/// Iterates the scalar values: the value itself, or every element of a list.
	pub fn scalars(&self) -> Box<dyn Iterator<Item = &PropertyValue> + '_> {
		match self {
			Self::List(items) => Box::new(items.iter().flat_map(PropertyValue::scalars)),
			other => Box::new(std::iter::once(other)),
		}
	}

	/// Parses a raw declaration value with an optional type hint.
	///
	/// Hints follow component declaration syntax (`String`, `Integer`, `Long`, `Boolean`);
	/// a missing hint means `String`.
	pub fn parse_typed(hint: Option<&str>, raw: &str) -> Result<Self, PropertyError> {
		match hint.map(str::trim) {
			None | Some("String") => Ok(Self::String(raw.to_string())),
			Some("Integer" | "Long" | "Short" | "Byte") => raw
				.trim()
				.parse::<i64>()
				.map(Self::Long)
				.map_err(|_| PropertyError::InvalidValue {
					hint: hint.unwrap_or_default().trim().to_string(),
					value: raw.to_string(),
				}),
			Some("Boolean") => Ok(Self::Bool(raw.trim().eq_ignore_ascii_case("true"))),
			Some(other) => Err(PropertyError::UnknownType(other.to_string())),
		}
	}
}

impl fmt::Display for PropertyValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::String(s) => f.write_str(s),
			Self::Long(n) => write!(f, "{n}"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::List(items) => {
				f.write_str("[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{item}")?;
				}
				f.write_str("]")
			}
		}
	}
}

impl From<&str> for PropertyValue {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for PropertyValue {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<i64> for PropertyValue {
	fn from(value: i64) -> Self {
		Self::Long(value)
	}
}

impl From<i32> for PropertyValue {
	fn from(value: i32) -> Self {
		Self::Long(i64::from(value))
	}
}

impl From<bool> for PropertyValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
	fn from(values: Vec<T>) -> Self {
		Self::List(values.into_iter().map(Into::into).collect())
	}
}

/// Errors raised while parsing property declarations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
	#[error("property declaration {0:?} is missing '='")]
	MissingSeparator(String),
	#[error("property declaration {0:?} has an empty key")]
	EmptyKey(String),
	#[error("unknown property type {0:?}")]
	UnknownType(String),
	#[error("value {value:?} is not a valid {hint}")]
	InvalidValue { hint: String, value: String },
}

/// Ordered property bag with case-insensitive keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
	entries: Vec<(String, PropertyValue)>,
}

impl Properties {
	pub fn new() -> Self {
		Self::default()
	}

	fn position(&self, key: &str) -> Option<usize> {
		self.entries.iter().position(|(k, _)| k.eq_ignore_ascii_case(key))
	}

	/// Inserts or replaces a value, returning the previous one.
	///
	/// Replacing keeps the original key spelling and position.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
		let key = key.into();
		let value = value.into();
		match self.position(&key) {
			Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
			None => {
				self.entries.push((key, value));
				None
			}
		}
	}

	/// Inserts a `key[:Type]=value` declaration, e.g. `service.ranking:Integer=2`.
	pub fn insert_declaration(&mut self, declaration: &str) -> Result<(), PropertyError> {
		let (lhs, raw) = declaration
			.split_once('=')
			.ok_or_else(|| PropertyError::MissingSeparator(declaration.to_string()))?;
		let (key, hint) = match lhs.split_once(':') {
			Some((key, hint)) => (key.trim(), Some(hint)),
			None => (lhs.trim(), None),
		};
		if key.is_empty() {
			return Err(PropertyError::EmptyKey(declaration.to_string()));
		}
		let value = PropertyValue::parse_typed(hint, raw)?;
		self.insert(key, value);
		Ok(())
	}

	pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
		let idx = self.position(key)?;
		Some(self.entries.remove(idx).1)
	}

	pub fn get(&self, key: &str) -> Option<&PropertyValue> {
		self.position(key).map(|idx| &self.entries[idx].1)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.position(key).is_some()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> + '_ {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Ranking of the service; absent or non-integer rankings count as 0.
	pub fn ranking(&self) -> i64 {
		self.get(keys::SERVICE_RANKING).and_then(PropertyValue::as_long).unwrap_or(0)
	}

	/// Identity name of the component, if declared.
	pub fn component_name(&self) -> Option<&str> {
		self.get(keys::COMPONENT_NAME).and_then(PropertyValue::as_str)
	}

	/// Type identifiers the service is registered under.
	pub fn object_classes(&self) -> Vec<&str> {
		self.get(keys::OBJECT_CLASS)
			.map(|v| v.scalars().filter_map(PropertyValue::as_str).collect())
			.unwrap_or_default()
	}
}

impl<K, V> FromIterator<(K, V)> for Properties
where
	K: Into<String>,
	V: Into<PropertyValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut props = Self::new();
		for (k, v) in iter {
			props.insert(k, v);
		}
		props
	}
}

impl<K, V> Extend<(K, V)> for Properties
where
	K: Into<String>,
	V: Into<PropertyValue>,
{
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		for (k, v) in iter {
			self.insert(k, v);
		}
	}
}
