use std::sync::Arc;

use pretty_assertions::assert_eq;
use sift_primitives::Properties;
use sift_registry::ServiceRegistry;
use sift_resolver::{Requester, ResolveRequest, SelectionCriteria};

use crate::common::{Consumer, IMULTI, IONE, fixture, run};

fn key_value() -> SelectionCriteria {
	SelectionCriteria::builder().property("key=value").build()
}

#[test]
fn higher_ranked_registration_is_reinjected() {
	let f = fixture();
	let consumer = Consumer::new(&f.resolver, key_value(), ResolveRequest::scalar(IMULTI).track(true));
	consumer.inject().unwrap();
	assert_eq!(consumer.current(), vec!["Run2"]);

	let run3 = f.registry.register(run("Run3", 3)).unwrap();
	assert_eq!(consumer.current(), vec!["Run3"]);

	run3.unregister().unwrap();
	assert_eq!(consumer.current(), vec!["Run2"]);
	assert_eq!(
		consumer.injections(),
		vec![vec!["Run2"], vec!["Run3"], vec!["Run2"]]
	);
	assert_eq!(f.resolver.subscriptions().tracked_count(), 1);
	assert_eq!(f.registry.listener_count(), 1);
}

#[test]
fn collection_is_reinjected() {
	let f = fixture();
	let all = Consumer::new(
		&f.resolver,
		SelectionCriteria::default(),
		ResolveRequest::collection(IMULTI).track(true),
	);
	let ranked_three = Consumer::new(
		&f.resolver,
		SelectionCriteria::builder().filter("(service.ranking=3)").build(),
		ResolveRequest::collection(IMULTI).track(true),
	);
	all.inject().unwrap();
	ranked_three.inject().unwrap();
	assert_eq!(all.current(), vec!["Run2", "Run1"]);
	assert!(ranked_three.current().is_empty());

	let run3 = f.registry.register(run("Run3", 3)).unwrap();
	assert_eq!(all.current(), vec!["Run3", "Run2", "Run1"]);
	assert_eq!(ranked_three.current(), vec!["Run3"]);

	run3.unregister().unwrap();
	assert_eq!(all.current(), vec!["Run2", "Run1"]);
	assert!(ranked_three.current().is_empty());
}

#[test]
fn unrelated_events_do_not_notify() {
	let f = fixture();
	let consumer = Consumer::new(
		&f.resolver,
		SelectionCriteria::builder().name("Run1").build(),
		ResolveRequest::scalar(IMULTI).track(true),
	);
	consumer.inject().unwrap();

	f.registry.register(run("Run3", 3)).unwrap();
	assert_eq!(consumer.injections(), vec![vec!["Run1"]]);
}

#[test]
fn property_change_that_ends_a_match_reinjects() {
	let f = fixture();
	let consumer = Consumer::new(&f.resolver, key_value(), ResolveRequest::scalar(IMULTI).track(true));
	consumer.inject().unwrap();

	let run3 = f.registry.register(run("Run3", 3)).unwrap();
	assert_eq!(consumer.current(), vec!["Run3"]);

	let mut properties = Properties::new();
	properties.insert("p", "Run3");
	properties.insert("service.ranking", 3);
	run3.set_properties(properties).unwrap();
	assert_eq!(consumer.current(), vec!["Run2"]);
}

#[test]
fn disposed_consumer_is_not_reinjected() {
	let f = fixture();
	let consumer = Consumer::new(&f.resolver, key_value(), ResolveRequest::scalar(IMULTI).track(true));
	consumer.inject().unwrap();
	consumer.dispose();

	f.registry.register(run("Run3", 3)).unwrap();
	assert_eq!(consumer.injections(), vec![vec!["Run2"]]);
}

#[test]
fn invalid_requester_still_resolves_once() {
	let f = fixture();
	let consumer = Consumer::new(
		&f.resolver,
		SelectionCriteria::default(),
		ResolveRequest::scalar(IONE).track(true),
	);
	consumer.dispose();
	consumer.inject().unwrap();
	assert_eq!(consumer.current(), vec!["OneService"]);
	assert!(f.resolver.subscriptions().is_tracked(consumer.id()));
}

#[test]
fn dropped_consumer_is_ignored() {
	let f = fixture();
	let consumer = Consumer::new(&f.resolver, key_value(), ResolveRequest::scalar(IMULTI).track(true));
	consumer.inject().unwrap();
	drop(consumer);

	let run3 = f.registry.register(run("Run3", 3)).unwrap();
	run3.unregister().unwrap();
	assert_eq!(f.resolver.subscriptions().tracked_count(), 1);
}

#[test]
fn resolving_without_tracking_stops_the_live_binding() {
	let f = fixture();
	let tracked = Consumer::new(&f.resolver, key_value(), ResolveRequest::scalar(IMULTI).track(true));
	tracked.inject().unwrap();
	assert!(f.resolver.subscriptions().is_tracked(tracked.id()));

	let requester: Arc<dyn Requester> = tracked.clone();
	f.resolver
		.resolve(&key_value(), &ResolveRequest::scalar(IMULTI).requester(requester))
		.unwrap();
	assert!(!f.resolver.subscriptions().is_tracked(tracked.id()));
	assert_eq!(f.registry.listener_count(), 0);

	f.registry.register(run("Run3", 3)).unwrap();
	assert_eq!(tracked.injections(), vec![vec!["Run2"]]);
}

#[test]
fn explicit_untrack_is_idempotent() {
	let f = fixture();
	let consumer = Consumer::new(&f.resolver, key_value(), ResolveRequest::scalar(IMULTI).track(true));
	consumer.inject().unwrap();

	assert!(f.resolver.untrack(consumer.id()));
	assert!(!f.resolver.untrack(consumer.id()));
	assert_eq!(f.registry.listener_count(), 0);
}

#[test]
fn repeated_tracking_keeps_one_listener_per_requester() {
	let f = fixture();
	let consumers: Vec<_> = (0..3)
		.map(|_| Consumer::new(&f.resolver, key_value(), ResolveRequest::scalar(IMULTI).track(true)))
		.collect();
	for _ in 0..3 {
		for consumer in &consumers {
			consumer.inject().unwrap();
		}
	}
	assert_eq!(f.resolver.subscriptions().tracked_count(), 3);
	assert_eq!(f.registry.listener_count(), 3);
	assert_eq!(f.resolver.subscriptions().requesters_for(IMULTI).len(), 3);

	let run3 = f.registry.register(run("Run3", 3)).unwrap();
	for consumer in &consumers {
		assert_eq!(consumer.injections().len(), 4);
	}
	run3.unregister().unwrap();
	assert_eq!(f.registry.listener_count(), 3);
}

#[test]
fn tracking_listener_sees_the_composed_filter() {
	let f = fixture();
	let compiled = key_value().compile().unwrap();
	assert_eq!(
		compiled.tracking_filter(IMULTI),
		"(&(objectClass=IMultipleService)(key=value))"
	);
	let matching = f.registry.query_all(IMULTI, Some(&compiled.tracking_filter(IMULTI))).unwrap();
	assert_eq!(matching.len(), 2);
}
