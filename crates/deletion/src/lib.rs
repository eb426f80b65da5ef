//! Deferred object deletion across re-entrant waits.
//!
//! Every nested dispatching wait (a modal dialog's inner loop, say) pushes a
//! pool. Objects are tagged with the pool current at their creation, and a
//! deletion request parks the object on the nearest live pool of its tag
//! instead of destroying it. Only the current pool is ever drained, so an
//! object is physically destroyed only once every call frame that could still
//! hold it has unwound.

mod pools;

pub use pools::{DeletionPools, PoolId, Reclaim, SuspendCookie};
