// Admission Controller & Waiting List

use crate::domain::{QueueStats, RequestId};
use std::collections::{HashMap, VecDeque};

/// Running-set key. Request ids may collide, slots never do.
pub(crate) type SlotId = u64;

/// A request moved from waiting into running
pub(super) struct Admitted<P> {
    pub slot: SlotId,
    pub id: RequestId,
    pub request: P,
}

/// Waiting list plus running set, guarded by the queue's mutex.
///
/// Every method is a single non-suspending step; callers never hold the
/// lock across an `.await`.
pub(super) struct Admission<P> {
    max_concurrent: usize,
    waiting: VecDeque<(RequestId, P)>,
    running: HashMap<SlotId, RequestId>,
    next_slot: SlotId,
}

impl<P> Admission<P> {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            waiting: VecDeque::new(),
            running: HashMap::new(),
            next_slot: 0,
        }
    }

    /// Append to the back of the waiting list
    pub fn push(&mut self, id: RequestId, request: P) {
        self.waiting.push_back((id, request));
    }

    /// Move the oldest waiting request into running if a slot is free
    pub fn admit_next(&mut self) -> Option<Admitted<P>> {
        if self.running.len() >= self.max_concurrent {
            return None;
        }
        let (id, request) = self.waiting.pop_front()?;
        let slot = self.next_slot;
        self.next_slot += 1;
        self.running.insert(slot, id.clone());
        Some(Admitted { slot, id, request })
    }

    /// Free a running slot; returns the id that held it
    pub fn release(&mut self, slot: SlotId) -> Option<RequestId> {
        self.running.remove(&slot)
    }

    /// Take every waiting request, oldest first
    pub fn drain_waiting(&mut self) -> Vec<(RequestId, P)> {
        self.waiting.drain(..).collect()
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            waiting_count: self.waiting.len(),
            running_count: self.running.len(),
            max_concurrent: self.max_concurrent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admission_with(max: usize, ids: &[&str]) -> Admission<()> {
        let mut admission = Admission::new(max);
        for id in ids {
            admission.push(id.to_string(), ());
        }
        admission
    }

    #[test]
    fn test_admits_up_to_ceiling() {
        let mut admission = admission_with(2, &["a", "b", "c"]);

        assert!(admission.admit_next().is_some());
        assert!(admission.admit_next().is_some());
        assert!(admission.admit_next().is_none());

        let stats = admission.stats();
        assert_eq!(stats.running_count, 2);
        assert_eq!(stats.waiting_count, 1);
        assert_eq!(stats.max_concurrent, 2);
    }

    #[test]
    fn test_fifo_order_and_release() {
        let mut admission = admission_with(1, &["first", "second"]);

        let first = admission.admit_next().unwrap();
        assert_eq!(first.id, "first");
        assert!(admission.admit_next().is_none());

        assert_eq!(admission.release(first.slot).as_deref(), Some("first"));
        let second = admission.admit_next().unwrap();
        assert_eq!(second.id, "second");
        assert_ne!(first.slot, second.slot);
    }

    #[test]
    fn test_colliding_ids_get_distinct_slots() {
        let mut admission = admission_with(4, &["dup", "dup"]);
        let a = admission.admit_next().unwrap();
        let b = admission.admit_next().unwrap();
        assert_ne!(a.slot, b.slot);

        admission.release(a.slot);
        assert_eq!(admission.stats().running_count, 1);
    }

    #[test]
    fn test_admit_on_empty_is_noop() {
        let mut admission: Admission<()> = Admission::new(1);
        assert!(admission.admit_next().is_none());
        assert!(admission.release(42).is_none());
    }

    #[test]
    fn test_drain_leaves_running_untouched() {
        let mut admission = admission_with(1, &["running", "w1", "w2"]);
        admission.admit_next().unwrap();

        let drained: Vec<RequestId> = admission.drain_waiting().into_iter().map(|(id, _)| id).collect();
        assert_eq!(drained, vec!["w1", "w2"]);
        assert_eq!(admission.waiting_len(), 0);
        assert_eq!(admission.stats().running_count, 1);
    }
}
