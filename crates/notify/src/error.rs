use thiserror::Error;

use crate::RunOnMainThread;

/// Reasons a notification push was refused.
///
/// A refused push means the requested work did not happen. A required callback
/// may still have run in [`NotifyMode::FinalizeOnly`](crate::NotifyMode::FinalizeOnly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotifyError {
	/// The queue has been finalized, before the push or while it was blocked.
	#[error("notification queue is shutting down")]
	ShuttingDown,
	/// A blocking push into the safe queue was made from the main thread, which
	/// is the only thread able to drain it.
	#[error("blocking safe notification cannot be served from the main thread")]
	SafeBlockOnMainThread,
	/// The option combination has no meaning.
	#[error("unsupported main-thread run options: {0:?}")]
	Unsupported(RunOnMainThread),
}
