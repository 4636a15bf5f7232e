#![cfg(feature = "local_host")]

use tendril::{local_host::LocalHost, raw, ConnectFlags, Host};

mod _validator;
use _validator::Validator;

fn recording(owner: &tendril::SignalOwner<_fixture::Entity>) -> Validator<(i32, String)> {
	let v = Validator::new();
	owner.moved.connect(
		{
			let v = v.clone();
			move |n, s| v.push((n, s))
		},
		ConnectFlags::DEFAULT,
	);
	v
}

#[test]
fn raw_delivery_reaches_typed_subscribers() {
	let (_host, owner) = _fixture::bound();
	let v = recording(&owner);

	owner
		.bindings()
		.deliver(2, vec![raw(7_i32), raw("seven".to_string())]);
	v.expect([(7, "seven".to_string())]);
}

/// Short argument vectors are padded with defaults rather than rejected.
/// This lenient conversion is deliberate, and this test pins it down.
#[test]
fn short_argument_vectors_are_padded_with_defaults() {
	let (_host, owner) = _fixture::bound();
	let v = recording(&owner);

	owner.bindings().deliver(2, vec![raw(7_i32)]);
	owner.bindings().deliver(2, vec![]);
	v.expect([(7, String::new()), (0, String::new())]);
}

#[test]
fn mistyped_arguments_are_replaced_by_defaults() {
	let (_host, owner) = _fixture::bound();
	let v = recording(&owner);

	owner
		.bindings()
		.deliver(2, vec![raw("seven"), raw("seven".to_string())]);
	v.expect([(0, "seven".to_string())]);
}

#[test]
fn extra_arguments_are_ignored() {
	let (_host, owner) = _fixture::bound();
	let v = recording(&owner);

	owner
		.bindings()
		.deliver(2, vec![raw(1_i32), raw("a".to_string()), raw(true)]);
	v.expect([(1, "a".to_string())]);
}

#[test]
fn deliveries_to_unknown_fields_are_ignored() {
	let (_host, owner) = _fixture::bound();
	let v = recording(&owner);

	owner.bindings().deliver(99, vec![raw(1_i32)]);
	v.expect([]);
}

#[test]
fn host_emissions_are_scoped_to_the_emitting_object() {
	let host = std::sync::Arc::new(LocalHost::new());
	let a = _fixture::bound_on(&host);
	let b = _fixture::bound_on(&host);
	let va = recording(&a);
	let vb = recording(&b);

	b.moved.emit(2, "b".to_string());
	host.emit(
		a.moved.name().unwrap(),
		a.bindings().object(),
		vec![raw(1_i32), raw("a".to_string())],
	);

	va.expect([(1, "a".to_string())]);
	vb.expect([(2, "b".to_string())]);
}

#[test]
fn dispatch_targets_do_not_keep_owners_alive() {
	let (_host, owner) = _fixture::bound();
	let dispatch = owner.bindings().dispatch();
	assert!(dispatch.deliver(0, vec![]));

	drop(owner);
	assert!(!dispatch.is_alive());
	assert!(!dispatch.deliver(0, vec![]));
}
