use pretty_assertions::assert_eq;
use rstest::rstest;
use sift_resolver::{ConfigError, ResolveError, ResolveRequest, Resolved, SelectionCriteria, SelectionMode};

use crate::common::{IMULTI, IONE, Run, fixture, implementation};

#[test]
fn single_provider_resolves() {
	let f = fixture();
	let resolved = f
		.resolve(SelectionCriteria::default(), ResolveRequest::scalar(IONE))
		.unwrap();
	assert_eq!(implementation(&resolved), "OneService");
}

#[test]
fn missing_service_is_not_found_unless_optional() {
	let f = fixture();
	let err = f
		.resolve(SelectionCriteria::default(), ResolveRequest::scalar("IFake"))
		.unwrap_err();
	assert!(matches!(err, ResolveError::NotFound { ref service_type, .. } if service_type == "IFake"));

	let resolved = f
		.resolve(SelectionCriteria::default(), ResolveRequest::scalar("IFake").optional(true))
		.unwrap();
	assert_eq!(resolved, Resolved::Absent);
}

#[test]
fn highest_ranking_wins_by_default() {
	let f = fixture();
	assert_eq!(f.one(SelectionCriteria::default()), "Run2");
}

#[test]
fn strict_selection_rejects_multiple_matches() {
	let f = fixture();
	let err = f
		.resolve(SelectionCriteria::builder().strict().build(), ResolveRequest::scalar(IMULTI))
		.unwrap_err();
	assert!(matches!(err, ResolveError::Ambiguous { count: 2, .. }), "{err}");
}

#[rstest]
#[case::name_run1(SelectionCriteria::builder().name("Run1").build(), "Run1")]
#[case::name_run2(SelectionCriteria::builder().name("Run2").build(), "Run2")]
#[case::property_run1(SelectionCriteria::builder().property("p=Run1").strict().build(), "Run1")]
#[case::property_run2(SelectionCriteria::builder().property("p=Run2").build(), "Run2")]
#[case::shared_property(SelectionCriteria::builder().property("key=value").build(), "Run2")]
#[case::filter_run1(SelectionCriteria::builder().filter("(p=Run1)").build(), "Run1")]
#[case::filter_run2(SelectionCriteria::builder().filter("(p=Run2)").build(), "Run2")]
#[case::tag_run1(SelectionCriteria::builder().require_tag("ARun1").build(), "Run1")]
#[case::tag_run2(SelectionCriteria::builder().require_tag("ARun2").build(), "Run2")]
#[case::without_tag_run1(SelectionCriteria::builder().exclude_tag("ARun1").build(), "Run2")]
#[case::without_tag_run2(SelectionCriteria::builder().exclude_tag("ARun2").build(), "Run1")]
#[case::type_run1(SelectionCriteria::builder().require_type("IRun1").build(), "Run1")]
#[case::type_run2(SelectionCriteria::builder().require_type("IRun2").build(), "Run2")]
#[case::without_type_run1(SelectionCriteria::builder().exclude_type("IRun1").build(), "Run2")]
#[case::without_type_run2(SelectionCriteria::builder().exclude_type("IRun2").build(), "Run1")]
#[case::names_or(SelectionCriteria::builder().names(["Run1", "Missing"]).strict().build(), "Run1")]
#[case::predicate(SelectionCriteria::builder().predicate(|r| r.ranking() < 2).build(), "Run1")]
fn criteria_select(#[case] criteria: SelectionCriteria, #[case] expected: &str) {
	let f = fixture();
	assert_eq!(f.one(criteria), expected);
}

#[test]
fn shared_property_is_ambiguous_under_strict_selection() {
	let f = fixture();
	let criteria = SelectionCriteria::builder()
		.property("key=value")
		.mode(SelectionMode::HighestRankingOrError)
		.build();
	let err = f.resolve(criteria, ResolveRequest::scalar(IMULTI)).unwrap_err();
	assert!(matches!(err, ResolveError::Ambiguous { count: 2, .. }), "{err}");
}

#[test]
fn malformed_criterion_is_a_configuration_error() {
	let f = fixture();
	let criteria = SelectionCriteria::builder()
		.name("visa")
		.property("p=Run1")
		.filter("p:=Run1")
		.build();
	let err = f.resolve(criteria, ResolveRequest::scalar(IMULTI)).unwrap_err();
	assert!(
		matches!(err, ResolveError::Configuration(ConfigError::InvalidFilter { .. })),
		"{err}"
	);
}

#[test]
fn contradictory_criteria_are_ambiguous() {
	let f = fixture();
	let criteria = SelectionCriteria::builder()
		.property("key=value")
		.filter("(|(p=Run1)(p=Run2))")
		.require_tag("ACommon")
		.require_type(IMULTI)
		.strict()
		.build();
	let err = f.resolve(criteria, ResolveRequest::scalar(IMULTI)).unwrap_err();
	assert!(matches!(err, ResolveError::Ambiguous { count: 2, .. }), "{err}");
}

#[test]
fn unknown_name_is_absent_when_optional() {
	let f = fixture();
	let criteria = SelectionCriteria::builder().name("fake").build();
	assert_eq!(f.maybe(criteria.clone()), None);

	let err = f.resolve(criteria, ResolveRequest::scalar(IMULTI)).unwrap_err();
	assert!(matches!(err, ResolveError::NotFound { .. }));
}

#[test]
fn collections_are_in_ranking_order() {
	let f = fixture();
	assert_eq!(f.all(SelectionCriteria::default()), vec!["Run2", "Run1"]);
	assert_eq!(f.all(SelectionCriteria::builder().require_tag("ARun1").build()), vec!["Run1"]);
	assert!(f.all(SelectionCriteria::builder().name("fake").build()).is_empty());
}

#[test]
fn collections_ignore_strict_selection() {
	let f = fixture();
	let criteria = SelectionCriteria::builder().property("key=value").strict().build();
	assert_eq!(f.all(criteria), vec!["Run2", "Run1"]);
}

#[rstest]
#[case::scalar(SelectionCriteria::builder().require_tag("ACommon").build(), ResolveRequest::scalar(IMULTI))]
#[case::collection(SelectionCriteria::builder().require_tag("ACommon").build(), ResolveRequest::collection(IMULTI))]
#[case::absent(SelectionCriteria::builder().name("fake").build(), ResolveRequest::scalar(IMULTI).optional(true))]
fn resolving_twice_is_idempotent(#[case] criteria: SelectionCriteria, #[case] request: ResolveRequest) {
	let f = fixture();
	let first = f.resolve(criteria.clone(), request.clone()).unwrap();
	let second = f.resolve(criteria, request).unwrap();
	assert_eq!(first, second);
	assert_eq!(f.registry.listener_count(), 0);
}

#[test]
fn resolved_value_downcasts() {
	let f = fixture();
	let resolved = f
		.resolve(SelectionCriteria::builder().name("Run1").build(), ResolveRequest::scalar(IMULTI))
		.unwrap();
	let value = resolved.single().and_then(|o| o.downcast::<Run>());
	assert_eq!(value.as_deref(), Some(&Run("Run1")));
}

#[test]
fn criteria_from_configuration() {
	let f = fixture();
	let set = sift_resolver::CriteriaSet::from_toml(
		r#"
		[criteria.first]
		properties = ["key=value"]
		excluded-tags = ["ARun2"]

		[criteria.strict]
		filter = "(key=value)"
		selection = "highest-ranking-or-error"
		"#,
	)
	.unwrap();

	let first = set.get("first").cloned().unwrap();
	assert_eq!(f.one(first), "Run1");

	let strict = set.get("strict").cloned().unwrap();
	let err = f.resolve(strict, ResolveRequest::scalar(IMULTI)).unwrap_err();
	assert!(matches!(err, ResolveError::Ambiguous { .. }));
}
