//! Selection criteria.
//!
//! Criteria are plain data: they can be built in code with [`SelectionCriteria::builder`]
//! or loaded from TOML, and are validated by [`SelectionCriteria::compile`].
//!
//! ```toml
//! [criteria.todo]
//! names = ["Run1", "Run2"]
//! properties = ["key=value"]
//! filter = "(p=Run1)"
//! required-tags = ["ARun1"]
//! excluded-types = ["IRun2"]
//! module-names = ["app.*"]
//! module-versions = ["[1.0.0,2.0.0)"]
//! selection = "highest-ranking-or-error"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use sift_registry::ServiceReference;

use crate::error::ConfigError;
use crate::selection::SelectionMode;

mod compile;

pub use compile::{CompiledCriteria, ModuleFilter};


/// Extra predicate over raw registry entries, applied while querying.
pub type CustomPredicate = Arc<dyn Fn(&ServiceReference) -> bool + Send + Sync>;

/// What a requester asks for.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectionCriteria {
	/// Identity names; any of them may match.
	#[serde(default)]
	pub names: Vec<String>,
	/// `key=value` clauses that must all match.
	#[serde(default, rename = "properties")]
	pub property_clauses: Vec<String>,
	/// Raw filter fragment, AND-combined with everything else.
	#[serde(default, rename = "filter")]
	pub raw_filter: String,
	/// Capability tags the implementation must carry.
	#[serde(default)]
	pub required_tags: Vec<String>,
	/// Capability tags the implementation must not carry.
	#[serde(default)]
	pub excluded_tags: Vec<String>,
	/// Types the instance must satisfy.
	#[serde(default)]
	pub required_types: Vec<String>,
	/// Types the instance must not satisfy.
	#[serde(default)]
	pub excluded_types: Vec<String>,
	/// Literal or glob (`*`, `?`) owning-module names.
	#[serde(default, rename = "module-names")]
	pub module_name_patterns: Vec<String>,
	/// Version ranges for the owning module: none, one shared range, or one per pattern.
	#[serde(default, rename = "module-versions")]
	pub module_version_ranges: Vec<String>,
	#[serde(skip)]
	pub custom_predicate: Option<CustomPredicate>,
	#[serde(default, rename = "selection")]
	pub selection_mode: SelectionMode,
}

impl SelectionCriteria {
	pub fn builder() -> CriteriaBuilder {
		CriteriaBuilder::default()
	}

	/// Parses a single criteria table.
	pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	/// Whether no criterion narrows the selection.
	pub fn is_unconstrained(&self) -> bool {
		self.names.is_empty()
			&& self.property_clauses.is_empty()
			&& self.raw_filter.trim().is_empty()
			&& self.required_tags.is_empty()
			&& self.excluded_tags.is_empty()
			&& self.required_types.is_empty()
			&& self.excluded_types.is_empty()
			&& self.module_name_patterns.is_empty()
			&& self.module_version_ranges.is_empty()
			&& self.custom_predicate.is_none()
	}
}

impl fmt::Debug for SelectionCriteria {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SelectionCriteria")
			.field("names", &self.names)
			.field("property_clauses", &self.property_clauses)
			.field("raw_filter", &self.raw_filter)
			.field("required_tags", &self.required_tags)
			.field("excluded_tags", &self.excluded_tags)
			.field("required_types", &self.required_types)
			.field("excluded_types", &self.excluded_types)
			.field("module_name_patterns", &self.module_name_patterns)
			.field("module_version_ranges", &self.module_version_ranges)
			.field("custom_predicate", &self.custom_predicate.as_ref().map(|_| ".."))
			.field("selection_mode", &self.selection_mode)
			.finish()
	}
}

/// Builder for [`SelectionCriteria`].
#[derive(Default)]
pub struct CriteriaBuilder {
	criteria: SelectionCriteria,
}

impl CriteriaBuilder {
	/// Adds an identity name. Duplicates are ignored.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		let name = name.into();
		if !self.criteria.names.contains(&name) {
			self.criteria.names.push(name);
		}
		self
	}

	pub fn names<I, S>(self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		names.into_iter().fold(self, |builder, name| builder.name(name))
	}

	/// Adds a `key=value` property clause.
	pub fn property(mut self, clause: impl Into<String>) -> Self {
		self.criteria.property_clauses.push(clause.into());
		self
	}

	pub fn filter(mut self, filter: impl Into<String>) -> Self {
		self.criteria.raw_filter = filter.into();
		self
	}

	pub fn require_tag(mut self, tag: impl Into<String>) -> Self {
		self.criteria.required_tags.push(tag.into());
		self
	}

	pub fn exclude_tag(mut self, tag: impl Into<String>) -> Self {
		self.criteria.excluded_tags.push(tag.into());
		self
	}

	pub fn require_type(mut self, type_name: impl Into<String>) -> Self {
		self.criteria.required_types.push(type_name.into());
		self
	}

	pub fn exclude_type(mut self, type_name: impl Into<String>) -> Self {
		self.criteria.excluded_types.push(type_name.into());
		self
	}

	pub fn module_name(mut self, pattern: impl Into<String>) -> Self {
		self.criteria.module_name_patterns.push(pattern.into());
		self
	}

	pub fn module_version(mut self, range: impl Into<String>) -> Self {
		self.criteria.module_version_ranges.push(range.into());
		self
	}

	pub fn predicate<F>(mut self, predicate: F) -> Self
	where
		F: Fn(&ServiceReference) -> bool + Send + Sync + 'static,
	{
		self.criteria.custom_predicate = Some(Arc::new(predicate));
		self
	}

	pub fn mode(mut self, mode: SelectionMode) -> Self {
		self.criteria.selection_mode = mode;
		self
	}

	/// Shorthand for [`SelectionMode::HighestRankingOrError`].
	pub fn strict(self) -> Self {
		self.mode(SelectionMode::HighestRankingOrError)
	}

	pub fn build(self) -> SelectionCriteria {
		self.criteria
	}
}

/// A document of named criteria tables under `[criteria.<name>]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CriteriaSet {
	#[serde(default)]
	criteria: BTreeMap<String, SelectionCriteria>,
}

impl CriteriaSet {
	pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	pub fn get(&self, name: &str) -> Option<&SelectionCriteria> {
		self.criteria.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
		self.criteria.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.criteria.len()
	}

	pub fn is_empty(&self) -> bool {
		self.criteria.is_empty()
	}

	/// Compiles every table, failing on the first invalid one.
	pub fn compile_all(&self) -> Result<BTreeMap<String, CompiledCriteria>, ConfigError> {
		self.criteria
			.iter()
			.map(|(name, criteria)| Ok((name.clone(), criteria.compile()?)))
			.collect()
	}
}
