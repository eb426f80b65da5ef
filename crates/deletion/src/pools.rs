use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap as HashMap;
use slab::Slab;

/// Key of a pool inside [`DeletionPools`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(usize);

/// An object handed back by a drain for physical destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reclaim<K> {
	pub key: K,
	/// Wait depth of the pool that was drained.
	pub depth: usize,
}

/// Token returned by [`DeletionPools::suspend_deletion`].
///
/// `None` in its place means the object was already suspended, and the
/// matching resume is a no-op.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "pass the cookie back to resume_deletion"]
pub struct SuspendCookie {
	pool: PoolId,
}

struct Pool<K> {
	parent: Option<PoolId>,
	/// Tagged objects plus live child pools.
	references: usize,
	to_delete: VecDeque<K>,
	defunct: bool,
	depth: usize,
}

impl<K> Pool<K> {
	fn new(parent: Option<PoolId>, depth: usize) -> Self {
		Self {
			parent,
			references: 0,
			to_delete: VecDeque::new(),
			defunct: false,
			depth,
		}
	}
}

#[derive(Debug, Clone, Copy)]
struct ObjectEntry {
	pool: PoolId,
	suspended: bool,
	deleted: bool,
	/// Deleted while suspended; waiting on the root pool.
	parked: bool,
}

/// Stack of deletion pools plus the pool tag of every live object.
///
/// Main thread only. Pools form a tree, but only the path from the current pool
/// to the root is live; every pool off that path is defunct and survives only
/// while objects still reference it.
pub struct DeletionPools<K> {
	pools: Slab<Pool<K>>,
	objects: HashMap<K, ObjectEntry>,
	root: PoolId,
	base: PoolId,
	current: PoolId,
	frozen: usize,
	drain_requested: bool,
}

impl<K> Default for DeletionPools<K>
where
	K: Copy + Eq + Hash + fmt::Debug,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<K> DeletionPools<K>
where
	K: Copy + Eq + Hash + fmt::Debug,
{
	/// Creates the root pool and the base pool above it.
	///
	/// The root is never drained before [`teardown`](Self::teardown); it parks
	/// objects whose deletion is suspended.
	pub fn new() -> Self {
		let mut pools = Slab::new();
		let root = PoolId(pools.insert(Pool::new(None, 0)));
		let base = PoolId(pools.insert(Pool::new(Some(root), 0)));
		pools[root.0].references += 1;
		Self {
			pools,
			objects: HashMap::default(),
			root,
			base,
			current: base,
			frozen: 0,
			drain_requested: false,
		}
	}

	/// Number of nested dispatching waits currently entered.
	pub fn depth(&self) -> usize {
		self.pools[self.current.0].depth
	}

	/// Pools still allocated, root and base included.
	pub fn pool_count(&self) -> usize {
		self.pools.len()
	}

	pub fn current(&self) -> PoolId {
		self.current
	}

	/// Live objects, deleted-but-pending ones included.
	pub fn object_count(&self) -> usize {
		self.objects.len()
	}

	pub fn contains(&self, key: K) -> bool {
		self.objects.contains_key(&key)
	}

	/// Whether deletion has been requested for `key`.
	pub fn is_deleted(&self, key: K) -> bool {
		self.objects.get(&key).is_some_and(|entry| entry.deleted)
	}

	/// Deletions waiting on the current pool.
	pub fn pending(&self) -> usize {
		self.pools[self.current.0].to_delete.len()
	}

	/// Returns and clears the flag set when a deletion landed on the current pool.
	pub fn take_drain_request(&mut self) -> bool {
		std::mem::take(&mut self.drain_requested)
	}

	/// Stops [`enter_wait`](Self::enter_wait) and [`leave_wait`](Self::leave_wait)
	/// from pushing or popping pools. Nests.
	pub fn freeze(&mut self) {
		self.frozen += 1;
	}

	pub fn thaw(&mut self) {
		debug_assert!(self.frozen > 0, "thaw without matching freeze");
		self.frozen = self.frozen.saturating_sub(1);
	}

	pub fn is_frozen(&self) -> bool {
		self.frozen > 0
	}

	/// Pushes a pool for a nested wait, draining the current one first.
	pub fn enter_wait(&mut self, dispatching: bool, reclaim: &mut impl FnMut(Reclaim<K>)) {
		if self.is_frozen() || !dispatching {
			return;
		}
		self.drain(reclaim);
		let depth = self.depth() + 1;
		let child = PoolId(self.pools.insert(Pool::new(Some(self.current), depth)));
		self.pools[self.current.0].references += 1;
		self.current = child;
		tracing::debug!(depth, "deletion.enter_wait");
	}

	/// Pops back to the parent pool, marking the left pool defunct.
	pub fn leave_wait(&mut self, dispatching: bool, reclaim: &mut impl FnMut(Reclaim<K>)) {
		if self.is_frozen() || !dispatching {
			return;
		}
		let left = self.current;
		let Some(parent) = self.pools[left.0].parent.filter(|_| left != self.base) else {
			tracing::warn!("deletion.leave_wait without matching enter_wait");
			return;
		};
		self.drain(reclaim);

		let pool = &mut self.pools[left.0];
		pool.defunct = true;
		let unreferenced = pool.references == 0;
		self.current = parent;
		if unreferenced {
			self.pools.remove(left.0);
			self.release(parent);
		}
		tracing::debug!(depth = self.depth(), collapsed = unreferenced, "deletion.leave_wait");
		self.drain(reclaim);
	}

	/// Tags a new object with the current pool.
	pub fn on_object_created(&mut self, key: K) {
		let entry = ObjectEntry {
			pool: self.current,
			suspended: false,
			deleted: false,
			parked: false,
		};
		if self.objects.insert(key, entry).is_some() {
			tracing::warn!(?key, "deletion.object registered twice");
			debug_assert!(false, "object {key:?} registered twice");
			return;
		}
		self.pools[self.current.0].references += 1;
	}

	/// Requests deferred deletion. Returns `false` if already requested or unknown.
	///
	/// The object lands on the nearest live pool of its tag once defunct
	/// ancestors have collapsed. A drain is requested when that pool is current.
	pub fn on_object_deleted(&mut self, key: K) -> bool {
		let Some(entry) = self.objects.get_mut(&key) else {
			tracing::warn!(?key, "deletion.delete of unknown object");
			return false;
		};
		if entry.deleted {
			return false;
		}
		entry.deleted = true;
		if entry.suspended {
			entry.parked = true;
			self.pools[self.root.0].to_delete.push_back(key);
			tracing::trace!(?key, "deletion.parked");
			return true;
		}
		let from = entry.pool;
		self.queue_for_deletion(key, from);
		true
	}

	/// Bookkeeping for an object destroyed outside [`drain`](Self::drain).
	pub fn on_object_destroyed(&mut self, key: K) {
		let Some(entry) = self.objects.remove(&key) else {
			return;
		};
		if entry.parked {
			self.pools[self.root.0].to_delete.retain(|queued| *queued != key);
		} else if entry.deleted {
			self.pools[entry.pool.0].to_delete.retain(|queued| *queued != key);
		}
		self.release(entry.pool);
	}

	/// Pins the object for the duration of a call that must not destroy it.
	///
	/// A deletion requested while suspended is parked on the root pool and
	/// re-queued by [`resume_deletion`](Self::resume_deletion).
	pub fn suspend_deletion(&mut self, key: K) -> Option<SuspendCookie> {
		let entry = self.objects.get_mut(&key)?;
		if entry.suspended || entry.deleted {
			return None;
		}
		entry.suspended = true;
		Some(SuspendCookie { pool: entry.pool })
	}

	pub fn resume_deletion(&mut self, key: K, cookie: Option<SuspendCookie>) {
		let Some(cookie) = cookie else {
			return;
		};
		let Some(entry) = self.objects.get_mut(&key) else {
			return;
		};
		debug_assert_eq!(entry.pool, cookie.pool, "pool tag changed while suspended");
		entry.suspended = false;
		if !entry.parked {
			return;
		}
		entry.parked = false;
		let from = entry.pool;
		self.pools[self.root.0].to_delete.retain(|queued| *queued != key);
		self.queue_for_deletion(key, from);
	}

	/// Destroys everything queued on the current pool. Returns how many.
	pub fn drain(&mut self, reclaim: &mut impl FnMut(Reclaim<K>)) -> usize {
		self.drain_requested = false;
		let depth = self.depth();
		let mut count = 0;
		while let Some(key) = self.pools[self.current.0].to_delete.pop_front() {
			if let Some(entry) = self.objects.remove(&key) {
				self.release(entry.pool);
			}
			count += 1;
			reclaim(Reclaim { key, depth });
		}
		if count > 0 {
			tracing::trace!(count, depth, "deletion.drain");
		}
		count
	}

	/// Unwinds every nested wait and destroys every pending deletion, parked
	/// ones included. Objects never deleted stay registered.
	pub fn teardown(&mut self, reclaim: &mut impl FnMut(Reclaim<K>)) {
		self.frozen = 0;
		while self.current != self.base {
			self.leave_wait(true, reclaim);
		}
		self.drain(reclaim);
		while let Some(key) = self.pools[self.root.0].to_delete.pop_front() {
			if let Some(entry) = self.objects.remove(&key) {
				self.release(entry.pool);
			}
			reclaim(Reclaim { key, depth: 0 });
		}
		tracing::debug!(remaining = self.objects.len(), pools = self.pools.len(), "deletion.teardown");
	}

	fn queue_for_deletion(&mut self, key: K, from: PoolId) {
		let released = self.release(from);
		let target = self.live_ancestor(released);
		let pool = &mut self.pools[target.0];
		pool.references += 1;
		pool.to_delete.push_back(key);
		if let Some(entry) = self.objects.get_mut(&key) {
			entry.pool = target;
		}
		if target == self.current {
			self.drain_requested = true;
		}
		tracing::trace!(?key, depth = self.pools[target.0].depth, "deletion.queued");
	}

	/// Drops one reference, collapsing defunct pools that reach zero.
	///
	/// Returns the pool where the walk stopped.
	fn release(&mut self, mut pool: PoolId) -> PoolId {
		loop {
			let node = &mut self.pools[pool.0];
			debug_assert!(node.references > 0, "pool reference underflow");
			node.references = node.references.saturating_sub(1);
			if node.references > 0 || !node.defunct {
				return pool;
			}
			let Some(parent) = node.parent else {
				return pool;
			};
			let removed = self.pools.remove(pool.0);
			debug_assert!(removed.to_delete.is_empty(), "collapsed pool still had pending deletions");
			tracing::debug!(depth = removed.depth, "deletion.pool_collapsed");
			pool = parent;
		}
	}

	fn live_ancestor(&self, mut pool: PoolId) -> PoolId {
		while self.pools[pool.0].defunct {
			match self.pools[pool.0].parent {
				Some(parent) => pool = parent,
				None => break,
			}
		}
		pool
	}
}

impl<K> fmt::Debug for DeletionPools<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DeletionPools")
			.field("pools", &self.pools.len())
			.field("objects", &self.objects.len())
			.field("depth", &self.pools[self.current.0].depth)
			.field("frozen", &self.frozen)
			.finish()
	}
}

#[cfg(test)]
mod tests;
