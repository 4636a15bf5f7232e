use thiserror::Error;

/// Why a [`SignalFuture`](`crate::SignalFuture`) resolved without a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum WaitError {
	/// The signal handle wasn't bound to a backend when it was awaited.
	#[error("the awaited signal handle is not bound")]
	Unbound,
	/// The backend was torn down (owner dropped or subscribers cleared) before the signal fired.
	#[error("the awaited signal was torn down before it fired")]
	Cancelled,
}
