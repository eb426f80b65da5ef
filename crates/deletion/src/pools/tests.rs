use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

type Pools = DeletionPools<u32>;

fn collect(reclaimed: &mut Vec<Reclaim<u32>>) -> impl FnMut(Reclaim<u32>) + '_ {
	move |r| reclaimed.push(r)
}

fn keys(reclaimed: &[Reclaim<u32>]) -> Vec<u32> {
	reclaimed.iter().map(|r| r.key).collect()
}

#[test]
fn setup_has_root_and_base() {
	let pools = Pools::new();
	assert_eq!(pools.pool_count(), 2);
	assert_eq!(pools.depth(), 0);
	assert!(!pools.is_frozen());
}

#[test]
fn paired_waits_leave_only_base() {
	let mut pools = Pools::new();
	let mut reclaimed = Vec::new();
	for _ in 0..5 {
		pools.enter_wait(true, &mut collect(&mut reclaimed));
	}
	assert_eq!(pools.depth(), 5);
	assert_eq!(pools.pool_count(), 7);
	for _ in 0..5 {
		pools.leave_wait(true, &mut collect(&mut reclaimed));
	}
	assert_eq!(pools.depth(), 0);
	assert_eq!(pools.pool_count(), 2);
	assert!(reclaimed.is_empty());
}

#[test]
fn non_dispatching_and_frozen_waits_are_ignored() {
	let mut pools = Pools::new();
	let mut reclaimed = Vec::new();
	pools.enter_wait(false, &mut collect(&mut reclaimed));
	assert_eq!(pools.depth(), 0);

	pools.freeze();
	pools.freeze();
	pools.enter_wait(true, &mut collect(&mut reclaimed));
	pools.thaw();
	pools.enter_wait(true, &mut collect(&mut reclaimed));
	assert_eq!(pools.depth(), 0, "still frozen after one thaw");
	pools.thaw();
	pools.enter_wait(true, &mut collect(&mut reclaimed));
	assert_eq!(pools.depth(), 1);
}

#[test]
fn deletion_in_creation_pool_requests_prompt_drain() {
	let mut pools = Pools::new();
	let mut reclaimed = Vec::new();
	pools.on_object_created(1);
	assert!(pools.on_object_deleted(1));
	assert!(!pools.on_object_deleted(1), "deletion is requested once");
	assert!(pools.take_drain_request());
	assert!(!pools.take_drain_request());

	assert_eq!(pools.drain(&mut collect(&mut reclaimed)), 1);
	assert_eq!(reclaimed, vec![Reclaim { key: 1, depth: 0 }]);
	assert!(!pools.contains(1));
}

#[test]
fn deletion_inside_nested_wait_waits_for_unwind() {
	let mut pools = Pools::new();
	let mut reclaimed = Vec::new();
	pools.on_object_created(1);

	pools.enter_wait(true, &mut collect(&mut reclaimed));
	pools.enter_wait(true, &mut collect(&mut reclaimed));
	pools.on_object_deleted(1);
	assert!(!pools.take_drain_request(), "object belongs to an outer pool");
	pools.drain(&mut collect(&mut reclaimed));
	assert!(reclaimed.is_empty());

	pools.leave_wait(true, &mut collect(&mut reclaimed));
	assert!(reclaimed.is_empty(), "one wait still open above the object's pool");

	pools.leave_wait(true, &mut collect(&mut reclaimed));
	assert_eq!(reclaimed, vec![Reclaim { key: 1, depth: 0 }]);
}

#[test]
fn object_from_defunct_pool_lands_on_live_ancestor() {
	let mut pools = Pools::new();
	let mut reclaimed = Vec::new();

	pools.enter_wait(true, &mut collect(&mut reclaimed));
	pools.on_object_created(7);
	pools.leave_wait(true, &mut collect(&mut reclaimed));
	assert_eq!(pools.pool_count(), 3, "defunct pool kept alive by its object");

	pools.enter_wait(true, &mut collect(&mut reclaimed));
	pools.on_object_deleted(7);
	assert_eq!(pools.pool_count(), 3, "defunct pool collapsed, sibling pool pushed");
	pools.drain(&mut collect(&mut reclaimed));
	assert!(reclaimed.is_empty(), "frames of the sibling wait may hold the object");

	pools.leave_wait(true, &mut collect(&mut reclaimed));
	assert_eq!(keys(&reclaimed), vec![7]);
	assert_eq!(pools.pool_count(), 2);
}

#[test]
fn suspended_object_survives_drains_until_resumed() {
	let mut pools = Pools::new();
	let mut reclaimed = Vec::new();
	pools.on_object_created(3);

	let cookie = pools.suspend_deletion(3);
	assert!(cookie.is_some());
	assert_eq!(pools.suspend_deletion(3), None, "nested suspension collapses");

	pools.on_object_deleted(3);
	pools.enter_wait(true, &mut collect(&mut reclaimed));
	pools.leave_wait(true, &mut collect(&mut reclaimed));
	pools.drain(&mut collect(&mut reclaimed));
	assert!(reclaimed.is_empty());

	pools.resume_deletion(3, None);
	assert!(reclaimed.is_empty(), "inner resume is a no-op");

	pools.resume_deletion(3, cookie);
	assert!(pools.take_drain_request());
	pools.drain(&mut collect(&mut reclaimed));
	assert_eq!(keys(&reclaimed), vec![3]);
}

#[test]
fn destroyed_objects_release_their_pool() {
	let mut pools = Pools::new();
	let mut reclaimed = Vec::new();
	pools.enter_wait(true, &mut collect(&mut reclaimed));
	pools.on_object_created(1);
	pools.on_object_created(2);
	pools.leave_wait(true, &mut collect(&mut reclaimed));
	assert_eq!(pools.pool_count(), 3);

	pools.on_object_destroyed(1);
	assert_eq!(pools.pool_count(), 3);
	pools.on_object_destroyed(2);
	assert_eq!(pools.pool_count(), 2);
	assert_eq!(pools.object_count(), 0);
}

#[test]
fn teardown_reclaims_pending_and_parked() {
	let mut pools = Pools::new();
	let mut reclaimed = Vec::new();
	pools.on_object_created(1);
	pools.on_object_created(2);
	pools.on_object_created(3);
	let _cookie = pools.suspend_deletion(2);
	pools.on_object_deleted(2);

	pools.enter_wait(true, &mut collect(&mut reclaimed));
	pools.enter_wait(true, &mut collect(&mut reclaimed));
	pools.on_object_deleted(1);

	pools.teardown(&mut collect(&mut reclaimed));
	let mut got = keys(&reclaimed);
	got.sort_unstable();
	assert_eq!(got, vec![1, 2]);
	assert_eq!(pools.depth(), 0);
	assert!(pools.contains(3), "never-deleted objects stay registered");
}

#[derive(Debug, Clone)]
enum Op {
	Enter,
	Leave,
	Create,
	Delete(usize),
	Drain,
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		2 => Just(Op::Enter),
		2 => Just(Op::Leave),
		3 => Just(Op::Create),
		3 => any::<usize>().prop_map(Op::Delete),
		1 => Just(Op::Drain),
	]
}

#[derive(Debug)]
struct Tracked {
	/// Shallowest wait depth seen since creation.
	min_depth: usize,
	/// Deepest pool the object may be reclaimed at, fixed at deletion time.
	allowed: Option<usize>,
}

proptest! {
	/// Objects are only reclaimed at or below the shallowest depth reached
	/// between their creation and deletion, and nested waits never leak pools.
	#[test]
	fn prop_no_premature_deletion(ops in proptest::collection::vec(op(), 1..200)) {
		let mut pools = Pools::new();
		let mut reclaimed: Vec<Reclaim<u32>> = Vec::new();
		let mut tracked: BTreeMap<u32, Tracked> = BTreeMap::new();
		let mut next_key = 0u32;

		for op in ops {
			match op {
				Op::Enter => pools.enter_wait(true, &mut collect(&mut reclaimed)),
				Op::Leave => {
					if pools.depth() > 0 {
						pools.leave_wait(true, &mut collect(&mut reclaimed));
					}
				}
				Op::Create => {
					pools.on_object_created(next_key);
					tracked.insert(next_key, Tracked { min_depth: pools.depth(), allowed: None });
					next_key += 1;
				}
				Op::Delete(pick) => {
					let live: Vec<u32> = tracked.iter().filter(|(_, t)| t.allowed.is_none()).map(|(k, _)| *k).collect();
					if !live.is_empty() {
						let key = live[pick % live.len()];
						if let Some(t) = tracked.get_mut(&key) {
							t.allowed = Some(t.min_depth);
						}
						prop_assert!(pools.on_object_deleted(key));
					}
				}
				Op::Drain => {
					pools.drain(&mut collect(&mut reclaimed));
				}
			}

			for r in reclaimed.drain(..) {
				let t = tracked.remove(&r.key);
				prop_assert!(t.is_some(), "object {} reclaimed twice", r.key);
				let allowed = t.and_then(|t| t.allowed);
				prop_assert!(allowed.is_some(), "object {} reclaimed without deletion", r.key);
				prop_assert!(r.depth <= allowed.unwrap_or(0), "object {} reclaimed at depth {} above {:?}", r.key, r.depth, allowed);
			}
			let depth = pools.depth();
			for t in tracked.values_mut().filter(|t| t.allowed.is_none()) {
				t.min_depth = t.min_depth.min(depth);
			}
		}

		while pools.depth() > 0 {
			pools.leave_wait(true, &mut collect(&mut reclaimed));
		}
		pools.drain(&mut collect(&mut reclaimed));
		for r in reclaimed.drain(..) {
			tracked.remove(&r.key);
		}
		prop_assert!(tracked.values().all(|t| t.allowed.is_none()), "every deleted object is reclaimed once unwound");

		let remaining: Vec<u32> = tracked.keys().copied().collect();
		for key in remaining {
			pools.on_object_deleted(key);
		}
		pools.drain(&mut collect(&mut reclaimed));
		prop_assert_eq!(pools.object_count(), 0);
		prop_assert_eq!(pools.pool_count(), 2);
	}
}
