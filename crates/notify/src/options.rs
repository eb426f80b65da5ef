use bitflags::bitflags;

bitflags! {
	/// Option word for [`NotifyQueue::run_on_main_thread`](crate::NotifyQueue::run_on_main_thread).
	///
	/// The empty word means "send, safe, not required": block until the main
	/// thread has run the callback from a safe dispatch point.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct RunOnMainThread: u32 {
		/// Queue and return immediately instead of blocking.
		const POST = 1 << 0;
		/// May run from any dispatch point, not only safe ones.
		const UNSAFE = 1 << 1;
		/// Always invoke the callback, in finalize-only mode during shutdown.
		const REQUIRED = 1 << 2;
		/// Run the callback directly on the calling thread. Must be used alone.
		const JUMP_TO = 1 << 3;
	}
}

impl RunOnMainThread {
	pub const fn blocks(self) -> bool {
		!self.contains(Self::POST)
	}

	pub const fn is_safe(self) -> bool {
		!self.contains(Self::UNSAFE)
	}

	pub const fn is_required(self) -> bool {
		self.contains(Self::REQUIRED)
	}
}
