use std::fmt;

use globset::{GlobBuilder, GlobMatcher};
use sift_filter::{compose, type_filter};
use sift_primitives::{ModuleInfo, VersionRange};
use sift_registry::ServiceReference;

use super::{CustomPredicate, SelectionCriteria};
use crate::error::ConfigError;
use crate::selection::SelectionMode;

/// Validated criteria, ready to resolve against a registry.
#[derive(Clone)]
pub struct CompiledCriteria {
	filter: Option<String>,
	modules: Option<ModuleFilter>,
	required_tags: Vec<String>,
	excluded_tags: Vec<String>,
	required_types: Vec<String>,
	excluded_types: Vec<String>,
	predicate: Option<CustomPredicate>,
	mode: SelectionMode,
}

impl SelectionCriteria {
	/// Validates the criteria without touching any registry.
	///
	/// Parses every module version range, checks that there are 0, 1 or one-per-pattern
	/// ranges, composes and parses the filter, and compiles module name globs.
	pub fn compile(&self) -> Result<CompiledCriteria, ConfigError> {
		if self.is_unconstrained() {
			return Ok(CompiledCriteria::unconstrained(self.selection_mode));
		}

		let ranges = self
			.module_version_ranges
			.iter()
			.map(|range| {
				VersionRange::parse(range).map_err(|source| ConfigError::InvalidVersionRange {
					range: range.clone(),
					source,
				})
			})
			.collect::<Result<Vec<_>, _>>()?;

		let patterns = self.module_name_patterns.len();
		if !matches!(ranges.len(), 0 | 1) && ranges.len() != patterns {
			return Err(ConfigError::RangeCardinality {
				patterns,
				ranges: ranges.len(),
			});
		}

		let modules = if patterns == 0 && ranges.is_empty() {
			None
		} else {
			let patterns = self
				.module_name_patterns
				.iter()
				.map(|p| ModulePattern::new(p))
				.collect::<Result<Vec<_>, _>>()?;
			Some(ModuleFilter { patterns, ranges })
		};

		let mut names: Vec<&str> = Vec::with_capacity(self.names.len());
		for name in &self.names {
			if !names.contains(&name.as_str()) {
				names.push(name);
			}
		}

		let filter = compose(&names, &self.property_clauses, &self.raw_filter);
		if let Some(filter) = &filter {
			sift_filter::parse(filter).map_err(|source| ConfigError::InvalidFilter {
				filter: filter.clone(),
				source,
			})?;
		}

		Ok(CompiledCriteria {
			filter,
			modules,
			required_tags: self.required_tags.clone(),
			excluded_tags: self.excluded_tags.clone(),
			required_types: self.required_types.clone(),
			excluded_types: self.excluded_types.clone(),
			predicate: self.custom_predicate.clone(),
			mode: self.selection_mode,
		})
	}
}

impl CompiledCriteria {
	fn unconstrained(mode: SelectionMode) -> Self {
		Self {
			filter: None,
			modules: None,
			required_tags: Vec::new(),
			excluded_tags: Vec::new(),
			required_types: Vec::new(),
			excluded_types: Vec::new(),
			predicate: None,
			mode,
		}
	}

	/// Composed registry filter; `None` when no name, property or raw filter was given.
	pub fn filter(&self) -> Option<&str> {
		self.filter.as_deref()
	}

	/// Listener filter for tracking `service_type` under these criteria.
	pub fn tracking_filter(&self, service_type: &str) -> String {
		match &self.filter {
			Some(filter) => format!("(&{}{filter})", type_filter(service_type)),
			None => type_filter(service_type),
		}
	}

	pub fn modules(&self) -> Option<&ModuleFilter> {
		self.modules.as_ref()
	}

	pub fn required_tags(&self) -> &[String] {
		&self.required_tags
	}

	pub fn excluded_tags(&self) -> &[String] {
		&self.excluded_tags
	}

	pub fn required_types(&self) -> &[String] {
		&self.required_types
	}

	pub fn excluded_types(&self) -> &[String] {
		&self.excluded_types
	}

	pub fn mode(&self) -> SelectionMode {
		self.mode
	}

	/// Evaluates the custom predicate; `true` when none is set.
	pub fn admits(&self, reference: &ServiceReference) -> bool {
		self.predicate.as_ref().is_none_or(|p| p(reference))
	}

	pub(crate) fn has_predicate(&self) -> bool {
		self.predicate.is_some()
	}
}

impl fmt::Debug for CompiledCriteria {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompiledCriteria")
			.field("filter", &self.filter)
			.field("modules", &self.modules)
			.field("required_tags", &self.required_tags)
			.field("excluded_tags", &self.excluded_tags)
			.field("required_types", &self.required_types)
			.field("excluded_types", &self.excluded_types)
			.field("predicate", &self.predicate.as_ref().map(|_| ".."))
			.field("mode", &self.mode)
			.finish()
	}
}

/// Owning-module constraint: name patterns and version ranges.
#[derive(Debug, Clone)]
pub struct ModuleFilter {
	patterns: Vec<ModulePattern>,
	ranges: Vec<VersionRange>,
}

impl ModuleFilter {
	/// Whether a service owned by `module` passes.
	///
	/// The first exactly matching pattern wins; globs are only consulted when no pattern
	/// matches literally. The matched pattern's index selects its range, or the single
	/// shared range applies. With no patterns, the shared range is tested alone. Services
	/// without a resolvable module never pass.
	pub fn admits(&self, module: Option<&ModuleInfo>) -> bool {
		let Some(module) = module else {
			return false;
		};

		let range = if self.patterns.is_empty() {
			self.ranges.first()
		} else {
			let Some(index) = self.match_index(&module.name) else {
				return false;
			};
			match self.ranges.as_slice() {
				[] => None,
				[shared] => Some(shared),
				per_pattern => per_pattern.get(index),
			}
		};

		range.is_none_or(|r| r.includes(&module.version))
	}

	fn match_index(&self, name: &str) -> Option<usize> {
		self.patterns
			.iter()
			.position(|p| p.literal == name)
			.or_else(|| {
				self.patterns
					.iter()
					.position(|p| p.glob.as_ref().is_some_and(|g| g.is_match(name)))
			})
	}
}

#[derive(Clone)]
struct ModulePattern {
	literal: String,
	glob: Option<GlobMatcher>,
}

impl ModulePattern {
	/// Only `*` and `?` are wildcards; every other character is literal.
	fn new(pattern: &str) -> Result<Self, ConfigError> {
		let glob = if pattern.contains(['*', '?']) {
			let mut escaped = String::with_capacity(pattern.len());
			for ch in pattern.chars() {
				match ch {
					'*' | '?' => escaped.push(ch),
					other => escaped.push_str(&globset::escape(other.encode_utf8(&mut [0; 4]))),
				}
			}
			let glob = GlobBuilder::new(&escaped)
				.literal_separator(false)
				.build()
				.map_err(|err| ConfigError::InvalidModulePattern {
					pattern: pattern.to_string(),
					reason: err.to_string(),
				})?;
			Some(glob.compile_matcher())
		} else {
			None
		};

		Ok(Self {
			literal: pattern.to_string(),
			glob,
		})
	}
}

impl fmt::Debug for ModulePattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.literal)
	}
}
