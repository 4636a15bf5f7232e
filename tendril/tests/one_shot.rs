#![cfg(feature = "local_host")]

use tendril::ConnectFlags;

mod _validator;
use _validator::Validator;

#[test]
fn one_shot_connections_fire_once() {
	let (host, owner) = _fixture::bound();
	let v = Validator::new();

	owner.score_changed.connect(
		{
			let v = v.clone();
			move |score| v.push(score)
		},
		ConnectFlags::ONE_SHOT,
	);
	assert_eq!(owner.score_changed.connection_count(), 1);

	owner.score_changed.emit(1);
	owner.score_changed.emit(2);

	v.expect([1]);
	assert_eq!(owner.score_changed.connection_count(), 0);
	assert_eq!(_fixture::bridges(&host, &owner, &owner.score_changed), 0);
}

#[test]
fn persistent_and_one_shot_side_by_side() {
	let (_host, owner) = _fixture::bound();
	let v = Validator::new();

	owner.moved.connect(
		{
			let v = v.clone();
			move |n, s: String| v.push(("A", n, s))
		},
		ConnectFlags::DEFAULT,
	);
	owner.moved.connect(
		{
			let v = v.clone();
			move |n, s: String| v.push(("B", n, s))
		},
		ConnectFlags::ONE_SHOT,
	);

	owner.moved.emit(1, "x".to_string());
	owner.moved.emit(2, "y".to_string());

	v.expect([
		("A", 1, "x".to_string()),
		("B", 1, "x".to_string()),
		("A", 2, "y".to_string()),
	]);
	assert_eq!(owner.moved.connection_count(), 1);
}

#[test]
fn connecting_twice_delivers_twice() {
	let (_host, owner) = _fixture::bound();
	let v = Validator::new();

	let callback = owner.score_changed.connect(
		{
			let v = v.clone();
			move |score| v.push(score)
		},
		ConnectFlags::DEFAULT,
	);
	owner
		.score_changed
		.connect_callback(&callback, ConnectFlags::DEFAULT);
	assert_eq!(owner.score_changed.connection_count(), 2);

	owner.score_changed.emit(5);
	v.expect([5, 5]);

	assert!(owner.score_changed.disconnect(&callback));
	owner.score_changed.emit(6);
	v.expect([6]);
}

#[test]
fn mixed_multiplicity_spends_only_the_one_shot() {
	let (_host, owner) = _fixture::bound();
	let v = Validator::new();

	let callback = owner.pressed.connect(
		{
			let v = v.clone();
			move || v.push("pressed")
		},
		ConnectFlags::ONE_SHOT,
	);
	owner.pressed.connect_callback(&callback, ConnectFlags::DEFAULT);

	owner.pressed.emit();
	owner.pressed.emit();

	v.expect(["pressed", "pressed", "pressed"]);
	assert!(owner.pressed.is_connected(&callback));
	assert_eq!(owner.pressed.connection_count(), 1);
}
