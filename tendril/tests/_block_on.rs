use std::{
	future::{Future, IntoFuture},
	pin::{pin, Pin},
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
	task::{Context, Poll, Wake, Waker},
};

/// Polls `f` once, expecting it to resolve.
#[track_caller]
pub fn assert_ready<T>(f: impl IntoFuture<Output = T>) -> T {
	let (_, waker) = WakeCounter::new();
	match poll_with(pin!(f.into_future()), &waker) {
		Poll::Ready(value) => value,
		Poll::Pending => panic!("expected the future to be ready"),
	}
}

/// Polls `f` once, expecting it to stay pending, then drops it.
#[track_caller]
pub fn assert_pending<T>(f: impl IntoFuture<Output = T>) {
	let (_, waker) = WakeCounter::new();
	assert!(
		poll_with(pin!(f.into_future()), &waker).is_pending(),
		"expected the future to be pending"
	);
}

/// Polls `f` in place, so that it isn't dropped (and disconnected) afterwards.
pub fn poll_with<F: Future>(f: Pin<&mut F>, waker: &Waker) -> Poll<F::Output> {
	f.poll(&mut Context::from_waker(waker))
}

/// A waker that counts how often it was woken.
pub struct WakeCounter(AtomicUsize);

impl WakeCounter {
	pub fn new() -> (Arc<Self>, Waker) {
		let counter = Arc::new(Self(AtomicUsize::new(0)));
		let waker = Waker::from(Arc::clone(&counter));
		(counter, waker)
	}

	pub fn count(&self) -> usize {
		self.0.load(Ordering::SeqCst)
	}
}

impl Wake for WakeCounter {
	fn wake(self: Arc<Self>) {
		self.wake_by_ref();
	}

	fn wake_by_ref(self: &Arc<Self>) {
		self.0.fetch_add(1, Ordering::SeqCst);
	}
}
