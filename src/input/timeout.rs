// Timeout scheduling for time-based gestures

use std::collections::VecDeque;

use super::action::ActionId;

/// Scheduler the phase engine hands modifier timeouts to
///
/// On expiry the owner calls back into the action's `notify_timer_expired`.
pub trait TimeoutScheduler {
    /// Wake `(action, binding, modifier)` at absolute time `time`
    fn schedule_timeout(
        &mut self,
        action: ActionId,
        binding_index: usize,
        modifier_index: usize,
        time: f64,
    );

    /// Drop a pending wake-up; unknown entries are ignored
    fn cancel_timeout(&mut self, action: ActionId, binding_index: usize, modifier_index: usize);
}

/// A pending wake-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeout {
    pub action: ActionId,
    pub binding_index: usize,
    pub modifier_index: usize,
    pub time: f64,
}

impl Timeout {
    fn is_for(&self, action: ActionId, binding_index: usize, modifier_index: usize) -> bool {
        self.action == action
            && self.binding_index == binding_index
            && self.modifier_index == modifier_index
    }
}

/// Wake-ups ordered by time; equal times keep scheduling order
#[derive(Debug, Default)]
pub struct TimeoutQueue {
    pending: VecDeque<Timeout>,
}

impl TimeoutQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every timeout due at or before `now`
    pub fn drain_expired(&mut self, now: f64) -> Vec<Timeout> {
        let due = self.pending.iter().take_while(|t| t.time <= now).count();
        self.pending.drain(..due).collect()
    }

    /// Earliest pending wake time
    pub fn next_wake_time(&self) -> Option<f64> {
        self.pending.front().map(|t| t.time)
    }

    pub fn is_pending(&self, action: ActionId, binding_index: usize, modifier_index: usize) -> bool {
        self.pending
            .iter()
            .any(|t| t.is_for(action, binding_index, modifier_index))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl TimeoutScheduler for TimeoutQueue {
    fn schedule_timeout(
        &mut self,
        action: ActionId,
        binding_index: usize,
        modifier_index: usize,
        time: f64,
    ) {
        log::trace!(
            "Timeout for {:?} binding {} modifier {} at {:.3}s",
            action,
            binding_index,
            modifier_index,
            time
        );
        let pos = self
            .pending
            .iter()
            .position(|t| t.time > time)
            .unwrap_or(self.pending.len());
        self.pending.insert(
            pos,
            Timeout {
                action,
                binding_index,
                modifier_index,
                time,
            },
        );
    }

    fn cancel_timeout(&mut self, action: ActionId, binding_index: usize, modifier_index: usize) {
        self.pending
            .retain(|t| !t.is_for(action, binding_index, modifier_index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_creation() {
        let queue = TimeoutQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.next_wake_time(), None);
    }

    #[test]
    fn test_ordered_by_time() {
        let mut queue = TimeoutQueue::new();
        let action = ActionId::from_u64(1);
        queue.schedule_timeout(action, 0, 0, 0.5);
        queue.schedule_timeout(action, 0, 1, 0.2);
        queue.schedule_timeout(action, 1, 0, 0.9);

        assert_eq!(queue.next_wake_time(), Some(0.2));

        let due = queue.drain_expired(0.5);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].modifier_index, 1);
        assert_eq!(due[1].modifier_index, 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_equal_times_keep_order() {
        let mut queue = TimeoutQueue::new();
        let action = ActionId::from_u64(1);
        queue.schedule_timeout(action, 0, 0, 1.0);
        queue.schedule_timeout(action, 0, 1, 1.0);

        let due = queue.drain_expired(1.0);
        assert_eq!(due[0].modifier_index, 0);
        assert_eq!(due[1].modifier_index, 1);
    }

    #[test]
    fn test_nothing_due() {
        let mut queue = TimeoutQueue::new();
        queue.schedule_timeout(ActionId::from_u64(1), 0, 0, 2.0);
        assert!(queue.drain_expired(1.0).is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimeoutQueue::new();
        let action = ActionId::from_u64(1);
        queue.schedule_timeout(action, 0, 0, 0.4);
        assert!(queue.is_pending(action, 0, 0));

        queue.cancel_timeout(action, 0, 0);
        assert!(!queue.is_pending(action, 0, 0));
        assert!(queue.drain_expired(10.0).is_empty());
    }

    #[test]
    fn test_cancel_only_matching() {
        let mut queue = TimeoutQueue::new();
        let jump = ActionId::from_u64(1);
        let fire = ActionId::from_u64(2);
        queue.schedule_timeout(jump, 0, 0, 0.4);
        queue.schedule_timeout(fire, 0, 0, 0.4);

        queue.cancel_timeout(jump, 0, 0);
        assert_eq!(queue.len(), 1);
        assert!(queue.is_pending(fire, 0, 0));
    }
}
