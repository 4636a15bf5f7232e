use std::{
	fmt::Debug,
	mem,
	sync::{Arc, Mutex},
};

/// Records values pushed from subscribers, which need `'static` captures.
pub struct Validator<T>(Arc<Mutex<Vec<T>>>);

impl<T> Validator<T> {
	pub fn new() -> Self {
		Self(Arc::new(Mutex::new(Vec::new())))
	}

	pub fn push(&self, value: T) {
		self.0.lock().unwrap().push(value);
	}

	/// Asserts that exactly `expected` was recorded since the last check, in order.
	#[track_caller]
	pub fn expect(&self, expected: impl IntoIterator<Item = T>)
	where
		T: Debug + PartialEq,
	{
		let recorded = mem::take(&mut *self.0.lock().unwrap());
		assert_eq!(recorded, expected.into_iter().collect::<Vec<_>>());
	}
}

impl<T> Clone for Validator<T> {
	fn clone(&self) -> Self {
		Self(Arc::clone(&self.0))
	}
}
