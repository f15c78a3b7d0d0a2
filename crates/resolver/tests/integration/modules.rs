use pretty_assertions::assert_eq;
use rstest::rstest;
use sift_primitives::{ModuleInfo, Version};
use sift_resolver::{ConfigError, ResolveError, ResolveRequest, SelectionCriteria};

use crate::common::{IMULTI, fixture, run};

fn modules(names: &[&str], ranges: &[&str]) -> SelectionCriteria {
	let builder = names
		.iter()
		.fold(SelectionCriteria::builder(), |b, name| b.module_name(*name));
	ranges.iter().fold(builder, |b, range| b.module_version(*range)).build()
}

#[rstest]
#[case::unknown_module(&["!fake!"], &[], None)]
#[case::exact_name(&["cl.annotation.test"], &[], Some("Run2"))]
#[case::glob_name(&["cl.annotation.*"], &[], Some("Run2"))]
#[case::bare_version(&[], &["1.0.0"], Some("Run2"))]
#[case::wide_range(&[], &["[1.0.0,100)"], Some("Run2"))]
#[case::range_below(&[], &["[0.0.1, 1.0.0)"], None)]
#[case::name_and_version(&["cl.annotation.test"], &["1.0.0"], Some("Run2"))]
#[case::per_pattern_ranges(&["cl.annotation.test", "cl.annotation"], &["1.0.0", "1.1.0"], Some("Run2"))]
#[case::version_too_high(&["cl.annotation.test"], &["100.0.0"], None)]
#[case::shared_range_gates_all(&["cl.annotation.test", "cl.annotation"], &["1.0.0"], Some("Run2"))]
#[case::shared_range_excludes(&["cl.annotation.test", "cl.annotation"], &["2.0.0"], None)]
fn module_criteria(#[case] names: &[&str], #[case] ranges: &[&str], #[case] expected: Option<&str>) {
	let f = fixture();
	assert_eq!(f.maybe(modules(names, ranges)).as_deref(), expected);
}

#[rstest]
#[case::two_ranges_one_name(&["cl.annotation.test"], &["1.0.0", "1.0.0"])]
#[case::three_ranges_two_names(&["a", "b"], &["1", "2", "3"])]
#[case::two_ranges_no_name(&[], &["1.0.0", "2.0.0"])]
fn range_cardinality_is_checked(#[case] names: &[&str], #[case] ranges: &[&str]) {
	let f = fixture();
	let err = f
		.resolve(modules(names, ranges), ResolveRequest::scalar(IMULTI))
		.unwrap_err();
	assert!(
		matches!(err, ResolveError::Configuration(ConfigError::RangeCardinality { .. })),
		"{err}"
	);
}

#[rstest]
#[case::with_name(&["cl.annotation.test"])]
#[case::without_name(&[])]
fn malformed_range_is_rejected(#[case] names: &[&str]) {
	let f = fixture();
	let err = f
		.resolve(modules(names, &["fake"]), ResolveRequest::scalar(IMULTI))
		.unwrap_err();
	assert!(
		matches!(err, ResolveError::Configuration(ConfigError::InvalidVersionRange { ref range, .. }) if range == "fake"),
		"{err}"
	);
}

#[test]
fn version_window_splits_modules() {
	let f = fixture();
	f.registry
		.register(run("Core15", 10).module(ModuleInfo::new("app.core", Version::new(1, 5, 0))))
		.unwrap();
	f.registry
		.register(run("Core20", 20).module(ModuleInfo::new("app.core", Version::new(2, 0, 0))))
		.unwrap();

	let criteria = modules(&["app.*"], &["[1.0.0,2.0.0)"]);
	let resolved = f.resolve(criteria, ResolveRequest::collection(IMULTI)).unwrap();
	assert_eq!(crate::common::names(resolved), vec!["Core15"]);
}

#[test]
fn services_without_module_are_dropped_by_module_criteria() {
	let f = fixture();
	f.registry
		.register(
			sift_registry::Registration::new("Loose", ())
				.provides(IMULTI)
				.ranking(50),
		)
		.unwrap();

	assert_eq!(f.one(SelectionCriteria::default()), "Loose");
	assert_eq!(f.maybe(modules(&["*"], &[])).as_deref(), Some("Run2"));
}
