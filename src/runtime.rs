//! Deferred callback queue
//!
//! All bounce animation runs on one cooperative event loop: callbacks are
//! queued with a delay and fired in due-time order, each running to
//! completion before the next one. The queue keeps its own millisecond clock
//! so it can be driven by a real timer (see the tokio driver) or stepped by
//! hand in tests.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Identifies a queued callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Internal wrapper ordering callbacks by due time
struct Scheduled<T> {
    due: u64,
    id: TimerId,
    task: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest due first, then earliest scheduled (BinaryHeap is a max-heap)
        match other.due.cmp(&self.due) {
            Ordering::Equal => other.id.cmp(&self.id),
            ordering => ordering,
        }
    }
}

pub struct TimerQueue<T> {
    now: u64,
    next_id: u64,
    heap: BinaryHeap<Scheduled<T>>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// Current queue time in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Queues `task` to fire `delay_ms` after the current time
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Scheduled {
            due: self.now.saturating_add(delay_ms),
            id,
            task,
        });
        id
    }

    /// Due time of the earliest queued callback
    pub fn next_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|scheduled| scheduled.due)
    }

    /// Pops the earliest callback due at or before `until`, moving the clock
    /// to its due time
    pub fn pop_due(&mut self, until: u64) -> Option<T> {
        if self.heap.peek()?.due > until {
            return None;
        }
        let scheduled = self.heap.pop()?;
        self.now = self.now.max(scheduled.due);
        Some(scheduled.task)
    }

    /// Moves the clock forward to `until` (never backwards)
    pub fn advance_clock(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    /// Drops every queued callback for which `keep` returns `false`
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.heap.retain(|scheduled| keep(&scheduled.task));
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TimerQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now", &self.now)
            .field("pending", &self.heap.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<T>(queue: &mut TimerQueue<T>, until: u64) -> Vec<T> {
        let mut fired = Vec::new();
        while let Some(task) = queue.pop_due(until) {
            fired.push(task);
        }
        queue.advance_clock(until);
        fired
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(30, "c");
        queue.schedule(10, "a");
        queue.schedule(20, "b");

        assert_eq!(queue.next_deadline(), Some(10));
        assert_eq!(drain(&mut queue, 25), vec!["a", "b"]);
        assert_eq!(queue.now(), 25);
        assert_eq!(drain(&mut queue, 100), vec!["c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_equal_due_times_fire_in_schedule_order() {
        let mut queue = TimerQueue::new();
        for i in 0..5 {
            queue.schedule(40, i);
        }
        assert_eq!(drain(&mut queue, 40), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_delays_are_relative_to_clock() {
        let mut queue = TimerQueue::new();
        queue.advance_clock(100);
        queue.schedule(5, ());
        assert_eq!(queue.next_deadline(), Some(105));

        queue.advance_clock(50);
        assert_eq!(queue.now(), 100);
    }

    #[test]
    fn test_pop_moves_clock_to_due_time() {
        let mut queue = TimerQueue::new();
        queue.schedule(7, 'x');
        assert_eq!(queue.pop_due(1000), Some('x'));
        assert_eq!(queue.now(), 7);
    }

    #[test]
    fn test_retain() {
        let mut queue = TimerQueue::new();
        queue.schedule(1, 1);
        queue.schedule(2, 2);
        queue.schedule(3, 3);
        queue.retain(|n| n % 2 == 1);
        assert_eq!(queue.len(), 2);
        assert_eq!(drain(&mut queue, 10), vec![1, 3]);
    }
}
