use std::fmt;
use std::str::FromStr;

use sift_primitives::{Properties, PropertyValue};

use crate::compose::escape_value;
use crate::parser::{ParseError, parse};

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
	/// Every operand matches.
	And(Vec<Filter>),
	/// At least one operand matches.
	Or(Vec<Filter>),
	Not(Box<Filter>),
	/// `(attr=value)`, with `value` unescaped.
	Equal { attr: String, value: String },
	/// `(attr=*)`
	Present(String),
}

impl Filter {
	pub fn equal(attr: impl Into<String>, value: impl Into<String>) -> Self {
		Self::Equal {
			attr: attr.into(),
			value: value.into(),
		}
	}

	/// Evaluates the filter against a property bag.
	///
	/// Attribute lookup is case-insensitive. A list-valued property matches an equality
	/// item if any of its elements does.
	pub fn matches(&self, properties: &Properties) -> bool {
		match self {
			Self::And(operands) => operands.iter().all(|f| f.matches(properties)),
			Self::Or(operands) => operands.iter().any(|f| f.matches(properties)),
			Self::Not(inner) => !inner.matches(properties),
			Self::Present(attr) => properties.contains_key(attr),
			Self::Equal { attr, value } => properties
				.get(attr)
				.is_some_and(|prop| prop.scalars().any(|scalar| scalar_equals(scalar, value))),
		}
	}
}

fn scalar_equals(scalar: &PropertyValue, expected: &str) -> bool {
	match scalar {
		PropertyValue::String(s) => s == expected,
		PropertyValue::Long(n) => expected.trim().parse::<i64>().is_ok_and(|v| v == *n),
		PropertyValue::Bool(b) => expected.trim().eq_ignore_ascii_case(if *b { "true" } else { "false" }),
		PropertyValue::List(_) => false,
	}
}

impl FromStr for Filter {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse(s)
	}
}

impl fmt::Display for Filter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::And(operands) | Self::Or(operands) => {
				f.write_str(if matches!(self, Self::And(_)) { "(&" } else { "(|" })?;
				for operand in operands {
					write!(f, "{operand}")?;
				}
				f.write_str(")")
			}
			Self::Not(inner) => write!(f, "(!{inner})"),
			Self::Equal { attr, value } => write!(f, "({attr}={})", escape_value(value)),
			Self::Present(attr) => write!(f, "({attr}=*)"),
		}
	}
}
