use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex as PlMutex;
use rstest::rstest;

use super::*;
use crate::{FnPing, NoPing, WakeEvent};

fn counting_queue() -> (NotifyQueue, Arc<AtomicUsize>) {
	let pings = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&pings);
	let queue = NotifyQueue::new(Arc::new(FnPing::new(move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
	})));
	(queue, pings)
}

fn wait_for_depth(queue: &NotifyQueue, total: usize) {
	let deadline = Instant::now() + Duration::from_secs(5);
	while queue.depth().total() < total {
		assert!(Instant::now() < deadline, "timed out waiting for {total} queued notifications");
		thread::sleep(Duration::from_millis(1));
	}
}

#[test]
fn dispatch_runs_callbacks_in_push_order() {
	let queue = NotifyQueue::new(Arc::new(NoPing));
	let order = Arc::new(PlMutex::new(Vec::new()));
	for label in ["a", "b", "c"] {
		let order = Arc::clone(&order);
		queue.push(NotifyCallback::plain(move || order.lock().push(label)), PushOptions::POST).unwrap();
	}
	assert_eq!(queue.depth().normal, 3);

	assert!(queue.dispatch(false));
	assert_eq!(*order.lock(), vec!["a", "b", "c"]);
	assert!(!queue.dispatch(false), "nothing left to dispatch");
}

#[test]
fn blocking_push_on_main_thread_runs_inline() {
	let (queue, pings) = counting_queue();
	let ran = Arc::new(AtomicBool::new(false));
	let flag = Arc::clone(&ran);

	let before = queue.depth();
	queue.push(NotifyCallback::plain(move || flag.store(true, Ordering::SeqCst)), PushOptions::SEND).unwrap();

	assert!(ran.load(Ordering::SeqCst));
	assert_eq!(queue.depth(), before);
	assert_eq!(pings.load(Ordering::SeqCst), 0, "inline path never pings");
}

#[test]
fn blocking_safe_push_on_main_thread_is_rejected() {
	let queue = NotifyQueue::new(Arc::new(NoPing));
	let ran = Arc::new(AtomicBool::new(false));
	let flag = Arc::clone(&ran);

	let result = queue.push(NotifyCallback::plain(move || flag.store(true, Ordering::SeqCst)), PushOptions::SEND.safe(true));

	assert_eq!(result, Err(NotifyError::SafeBlockOnMainThread));
	assert!(!ran.load(Ordering::SeqCst));
	assert_eq!(queue.depth().total(), 0);
}

#[test]
fn safe_queue_waits_for_safe_dispatch() {
	let queue = NotifyQueue::new(Arc::new(NoPing));
	let ran = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&ran);
	queue
		.push(
			NotifyCallback::plain(move || {
				counter.fetch_add(1, Ordering::SeqCst);
			}),
			PushOptions::POST.safe(true),
		)
		.unwrap();

	assert!(!queue.dispatch(false));
	assert_eq!(ran.load(Ordering::SeqCst), 0);
	assert_eq!(queue.depth().safe, 1);

	assert!(queue.dispatch(true));
	assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn ping_is_debounced_until_dispatch() {
	let (queue, pings) = counting_queue();
	for _ in 0..4 {
		queue.push(NotifyCallback::plain(|| {}), PushOptions::POST).unwrap();
	}
	assert_eq!(pings.load(Ordering::SeqCst), 1);

	queue.dispatch(false);
	queue.push(NotifyCallback::plain(|| {}), PushOptions::POST).unwrap();
	assert_eq!(pings.load(Ordering::SeqCst), 2);
}

#[test]
fn worker_blocks_until_main_thread_dispatches() {
	let wake = Arc::new(WakeEvent::new());
	let queue = Arc::new(NotifyQueue::new(wake.clone()));
	let main_id = thread::current().id();
	let ran_on = Arc::new(PlMutex::new(None));

	let worker = {
		let queue = Arc::clone(&queue);
		let ran_on = Arc::clone(&ran_on);
		thread::spawn(move || {
			queue.push(
				NotifyCallback::plain(move || *ran_on.lock() = Some(thread::current().id())),
				PushOptions::SEND,
			)
		})
	};

	let started = Instant::now();
	assert!(wake.wait_timeout(Duration::from_secs(5)), "push must ping the main thread");
	assert!(started.elapsed() < Duration::from_secs(5));
	assert!(queue.dispatch(false));

	assert_eq!(worker.join().unwrap(), Ok(()));
	assert_eq!(*ran_on.lock(), Some(main_id));
	assert_eq!(queue.sync_events().pooled(), 1, "waiter returns its event to the pool");
}

#[test]
fn finalize_releases_blocked_workers() {
	let queue = Arc::new(NotifyQueue::new(Arc::new(NoPing)));
	let plain_runs = Arc::new(AtomicUsize::new(0));
	let finalize_only = Arc::new(AtomicUsize::new(0));

	let mut workers = Vec::new();
	for safe in [false, true, false] {
		let queue = Arc::clone(&queue);
		let plain_runs = Arc::clone(&plain_runs);
		workers.push(thread::spawn(move || {
			queue.push(
				NotifyCallback::plain(move || {
					plain_runs.fetch_add(1, Ordering::SeqCst);
				}),
				PushOptions::SEND.safe(safe),
			)
		}));
	}
	{
		let queue = Arc::clone(&queue);
		let finalize_only = Arc::clone(&finalize_only);
		workers.push(thread::spawn(move || {
			queue.push(
				NotifyCallback::required(move |mode| {
					if mode == NotifyMode::FinalizeOnly {
						finalize_only.fetch_add(1, Ordering::SeqCst);
					}
				}),
				PushOptions::SEND,
			)
		}));
	}

	wait_for_depth(&queue, 4);
	queue.finalize();

	for worker in workers {
		assert_eq!(worker.join().unwrap(), Err(NotifyError::ShuttingDown), "released without acting");
	}
	assert_eq!(queue.depth().total(), 0);
	assert_eq!(plain_runs.load(Ordering::SeqCst), 0, "plain callbacks are dropped at shutdown");
	assert_eq!(finalize_only.load(Ordering::SeqCst), 1);
	assert_eq!(queue.sync_events().pooled(), 0);

	let late = queue.push(NotifyCallback::plain(|| {}), PushOptions::POST);
	assert_eq!(late, Err(NotifyError::ShuttingDown));
}

#[test]
fn run_on_main_thread_jump_to_runs_directly() {
	let queue = NotifyQueue::new(Arc::new(NoPing));
	let ran = Arc::new(AtomicBool::new(false));
	let flag = Arc::clone(&ran);
	queue
		.run_on_main_thread(move |mode| flag.store(mode == NotifyMode::Act, Ordering::SeqCst), RunOnMainThread::JUMP_TO)
		.unwrap();
	assert!(ran.load(Ordering::SeqCst));
	assert_eq!(queue.depth().total(), 0);
}

#[rstest]
#[case(RunOnMainThread::JUMP_TO | RunOnMainThread::POST)]
#[case(RunOnMainThread::JUMP_TO | RunOnMainThread::REQUIRED)]
#[case(RunOnMainThread::empty())]
#[case(RunOnMainThread::REQUIRED)]
fn run_on_main_thread_rejects_meaningless_options(#[case] options: RunOnMainThread) {
	let queue = NotifyQueue::new(Arc::new(NoPing));
	assert_eq!(queue.run_on_main_thread(|_| {}, options), Err(NotifyError::Unsupported(options)));
}

#[test]
fn run_on_main_thread_post_required_queues_required_callback() {
	let queue = NotifyQueue::new(Arc::new(NoPing));
	let modes = Arc::new(PlMutex::new(Vec::new()));
	let seen = Arc::clone(&modes);
	queue
		.run_on_main_thread(move |mode| seen.lock().push(mode), RunOnMainThread::POST | RunOnMainThread::REQUIRED)
		.unwrap();
	assert_eq!(queue.depth().safe, 1);

	queue.finalize();
	assert_eq!(*modes.lock(), vec![NotifyMode::FinalizeOnly]);
}
