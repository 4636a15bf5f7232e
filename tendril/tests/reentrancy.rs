#![cfg(feature = "local_host")]

use std::{
	panic::{catch_unwind, AssertUnwindSafe},
	sync::atomic::{AtomicBool, Ordering},
};

use tendril::{Callback, ConnectFlags};

mod _validator;
use _validator::Validator;

#[test]
fn disconnecting_during_a_pass_takes_effect_afterwards() {
	let (_host, owner) = _fixture::bound();
	let v = Validator::new();

	let b = Callback::new({
		let v = v.clone();
		move |(score,): (i32,)| v.push(("b", score))
	});
	owner.score_changed.connect(
		{
			let v = v.clone();
			let b = b.clone();
			let signal = owner.score_changed.clone();
			move |score| {
				v.push(("a", score));
				signal.disconnect(&b);
			}
		},
		ConnectFlags::DEFAULT,
	);
	owner.score_changed.connect_callback(&b, ConnectFlags::DEFAULT);

	owner.score_changed.emit(1);
	owner.score_changed.emit(2);

	v.expect([("a", 1), ("b", 1), ("a", 2)]);
}

#[test]
fn connecting_during_a_pass_takes_effect_afterwards() {
	let (_host, owner) = _fixture::bound();
	let v = Validator::new();
	let connected = AtomicBool::new(false);

	owner.score_changed.connect(
		{
			let v = v.clone();
			let signal = owner.score_changed.clone();
			move |score| {
				v.push(("a", score));
				if !connected.swap(true, Ordering::Relaxed) {
					signal.connect(
						{
							let v = v.clone();
							move |score| v.push(("late", score))
						},
						ConnectFlags::DEFAULT,
					);
				}
			}
		},
		ConnectFlags::DEFAULT,
	);

	owner.score_changed.emit(1);
	owner.score_changed.emit(2);

	v.expect([("a", 1), ("a", 2), ("late", 2)]);
}

#[test]
fn reentrant_emission_fires_one_shots_once() {
	let (host, owner) = _fixture::bound();
	let v = Validator::new();

	owner.score_changed.connect(
		{
			let v = v.clone();
			move |score| v.push(("persistent", score))
		},
		ConnectFlags::DEFAULT,
	);
	owner.score_changed.connect(
		{
			let v = v.clone();
			let signal = owner.score_changed.clone();
			move |score| {
				v.push(("one-shot", score));
				if score == 1 {
					signal.emit(2);
				}
			}
		},
		ConnectFlags::ONE_SHOT,
	);

	owner.score_changed.emit(1);

	v.expect([("persistent", 1), ("one-shot", 1), ("persistent", 2)]);
	assert_eq!(owner.score_changed.connection_count(), 1);
	assert_eq!(_fixture::bridges(&host, &owner, &owner.score_changed), 1);
}

#[test]
fn subscribers_may_tear_down_their_own_signal() {
	let (host, owner) = _fixture::bound();
	let v = Validator::new();

	owner.pressed.connect(
		{
			let v = v.clone();
			let signal = owner.pressed.clone();
			move || {
				v.push("first");
				signal.disconnect_all();
			}
		},
		ConnectFlags::DEFAULT,
	);
	owner.pressed.connect(
		{
			let v = v.clone();
			move || v.push("second")
		},
		ConnectFlags::DEFAULT,
	);

	owner.pressed.emit();
	owner.pressed.emit();

	v.expect(["first", "second"]);
	assert_eq!(_fixture::bridges(&host, &owner, &owner.pressed), 0);
}

#[test]
fn a_panicking_subscriber_still_spends_one_shots() {
	let (host, owner) = _fixture::bound();
	let v = Validator::new();

	owner.score_changed.connect(
		{
			let v = v.clone();
			move |score| v.push(score)
		},
		ConnectFlags::ONE_SHOT,
	);
	owner.score_changed.connect(
		|score: i32| assert_ne!(score, 1, "subscriber failure"),
		ConnectFlags::ONE_SHOT,
	);

	let result = catch_unwind(AssertUnwindSafe(|| owner.score_changed.emit(1)));
	assert!(result.is_err());
	v.expect([1]);

	assert_eq!(owner.score_changed.connection_count(), 0);
	assert_eq!(_fixture::bridges(&host, &owner, &owner.score_changed), 0);

	owner.score_changed.emit(2);
	v.expect([]);
}
