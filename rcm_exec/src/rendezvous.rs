//! # Pose and input rendezvous
//!
//! Joins the two asynchronous inputs of the control loop, arm pose feedback and operator input,
//! so that a cycle only runs once both have been freshly received. Client threads post into
//! single-value slots (a newer value replaces an unconsumed one), the loop blocks on a condition
//! variable until the slots it needs are full and then empties them under the same lock.
//!
//! Each [`RendezvousSender`] counts as a producer. Once every producer has been dropped a wait
//! that cannot be satisfied returns [`WaitResult::Disconnected`] instead of blocking forever.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Producer side of the rendezvous, cloned for each client thread.
pub struct RendezvousSender<P, I> {
    shared: Arc<Shared<P, I>>,
}

/// Consumer side of the rendezvous, owned by the control loop.
pub struct Rendezvous<P, I> {
    shared: Arc<Shared<P, I>>,
}

struct Shared<P, I> {
    slots: Mutex<Slots<P, I>>,
    cond: Condvar,
}

struct Slots<P, I> {
    pose: Option<P>,
    input: Option<I>,
    num_producers: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Outcome of waiting on the rendezvous.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitResult<T> {
    /// The awaited values, now cleared from the rendezvous.
    Ready(T),

    /// The timeout elapsed before the awaited values arrived. Any value that did arrive is left
    /// pending.
    TimedOut,

    /// All producers are gone and the awaited values never arrived.
    Disconnected,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a new rendezvous with a single producer handle.
pub fn channel<P, I>() -> (RendezvousSender<P, I>, Rendezvous<P, I>) {
    let shared = Arc::new(Shared {
        slots: Mutex::new(Slots {
            pose: None,
            input: None,
            num_producers: 1,
        }),
        cond: Condvar::new(),
    });

    (
        RendezvousSender {
            shared: shared.clone(),
        },
        Rendezvous { shared },
    )
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P, I> Shared<P, I> {
    /// Lock the slots. The slots are plain values which are never left half written, so a panic
    /// in another thread while holding the lock doesn't invalidate them.
    fn lock(&self) -> MutexGuard<'_, Slots<P, I>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until `ready` holds for the slots, or the timeout elapses, or there are no producers
    /// left. Returns the guard and whether `ready` holds.
    fn wait_until<F>(
        &self,
        timeout: Option<Duration>,
        ready: F,
    ) -> (MutexGuard<'_, Slots<P, I>>, bool)
    where
        F: Fn(&Slots<P, I>) -> bool,
    {
        let guard = self.lock();
        let blocked = |s: &mut Slots<P, I>| !ready(&*s) && s.num_producers > 0;

        let guard = match timeout {
            Some(t) => {
                self.cond
                    .wait_timeout_while(guard, t, blocked)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .cond
                .wait_while(guard, blocked)
                .unwrap_or_else(PoisonError::into_inner),
        };

        let is_ready = ready(&*guard);
        (guard, is_ready)
    }
}

impl<P, I> RendezvousSender<P, I> {
    /// Post a new pose, replacing any pose not yet consumed.
    pub fn post_pose(&self, pose: P) {
        self.shared.lock().pose = Some(pose);
        self.shared.cond.notify_all();
    }

    /// Post a new input event, replacing any event not yet consumed.
    pub fn post_input(&self, input: I) {
        self.shared.lock().input = Some(input);
        self.shared.cond.notify_all();
    }
}

impl<P, I> Clone for RendezvousSender<P, I> {
    fn clone(&self) -> Self {
        self.shared.lock().num_producers += 1;

        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<P, I> Drop for RendezvousSender<P, I> {
    fn drop(&mut self) {
        {
            let mut slots = self.shared.lock();
            slots.num_producers = slots.num_producers.saturating_sub(1);
        }
        self.shared.cond.notify_all();
    }
}

impl<P, I> Rendezvous<P, I> {
    /// Wait for a pose only, leaving any pending input in place.
    pub fn wait_pose(&self, timeout: Option<Duration>) -> WaitResult<P> {
        let (mut slots, ready) = self.shared.wait_until(timeout, |s| s.pose.is_some());

        match (ready, slots.pose.take()) {
            (true, Some(pose)) => WaitResult::Ready(pose),
            _ if slots.num_producers == 0 => WaitResult::Disconnected,
            _ => WaitResult::TimedOut,
        }
    }

    /// Wait until both a pose and an input are pending, then take both.
    pub fn wait_both(&self, timeout: Option<Duration>) -> WaitResult<(P, I)> {
        let (mut slots, ready) = self
            .shared
            .wait_until(timeout, |s| s.pose.is_some() && s.input.is_some());

        if ready {
            if let (Some(pose), Some(input)) = (slots.pose.take(), slots.input.take()) {
                return WaitResult::Ready((pose, input));
            }
        }

        if slots.num_producers == 0 {
            WaitResult::Disconnected
        } else {
            WaitResult::TimedOut
        }
    }

    /// True if a pose is waiting to be consumed.
    pub fn pose_pending(&self) -> bool {
        self.shared.lock().pose.is_some()
    }

    /// True if an input is waiting to be consumed.
    pub fn input_pending(&self) -> bool {
        self.shared.lock().input.is_some()
    }

    /// Number of live producer handles.
    pub fn num_producers(&self) -> usize {
        self.shared.lock().num_producers
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{thread, time::Instant};

    const SHORT: Option<Duration> = Some(Duration::from_millis(20));

    #[test]
    fn test_take_and_clear() {
        let (tx, rx) = channel::<u32, &str>();

        tx.post_pose(1);
        tx.post_input("a");
        assert_eq!(rx.wait_both(SHORT), WaitResult::Ready((1, "a")));

        // Both slots are empty again
        assert!(!rx.pose_pending() && !rx.input_pending());
        assert_eq!(rx.wait_both(SHORT), WaitResult::TimedOut);
    }

    #[test]
    fn test_pose_alone_does_not_complete() {
        let (tx, rx) = channel::<u32, &str>();

        tx.post_pose(1);
        assert_eq!(rx.wait_both(SHORT), WaitResult::TimedOut);

        // The pose is still pending and the newest one wins
        assert!(rx.pose_pending());
        tx.post_pose(2);
        tx.post_input("a");
        assert_eq!(rx.wait_both(None), WaitResult::Ready((2, "a")));
    }

    #[test]
    fn test_wait_pose_keeps_input() {
        let (tx, rx) = channel::<u32, &str>();

        tx.post_input("early");
        tx.post_pose(7);
        assert_eq!(rx.wait_pose(None), WaitResult::Ready(7));
        assert!(rx.input_pending());
        assert!(!rx.pose_pending());
    }

    #[test]
    fn test_blocks_until_posted() {
        let (tx, rx) = channel::<u32, u32>();
        let tx2 = tx.clone();

        let start = Instant::now();
        let jh = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            tx.post_pose(10);
            thread::sleep(Duration::from_millis(30));
            tx2.post_input(20);
        });

        assert_eq!(rx.wait_both(None), WaitResult::Ready((10, 20)));
        assert!(start.elapsed() >= Duration::from_millis(60));
        jh.join().unwrap();
    }

    #[test]
    fn test_disconnect() {
        let (tx, rx) = channel::<u32, u32>();
        let tx2 = tx.clone();
        assert_eq!(rx.num_producers(), 2);

        drop(tx);
        assert_eq!(rx.wait_pose(SHORT), WaitResult::TimedOut);

        // Values posted before the last producer goes are still delivered
        tx2.post_pose(3);
        drop(tx2);
        assert_eq!(rx.num_producers(), 0);
        assert_eq!(rx.wait_pose(None), WaitResult::Ready(3));
        assert_eq!(rx.wait_both(None), WaitResult::Disconnected);
    }

    #[test]
    fn test_disconnect_wakes_waiter() {
        let (tx, rx) = channel::<u32, u32>();

        let jh = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(tx);
        });

        assert_eq!(rx.wait_both(None), WaitResult::Disconnected);
        jh.join().unwrap();
    }
}
