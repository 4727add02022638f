//! Time-ordered medium events
//!
//! Events are popped by time; events sharing an instant are popped in a fixed
//! order so removals always precede additions:
//!
//! | Rank | Event |
//! |------|-------|
//! | 0 | `SignalEnd` |
//! | 1 | `RxEnd` |
//! | 2 | `SignalStart` |
//! | 3 | `RxStart` |
//!
//! Events with equal time and rank keep their scheduling order.

use specint_core::spectrum::SpectrumValue;
use specint_core::SimTime;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Something that happens in the medium at an instant
#[derive(Debug, Clone)]
pub enum MediumEvent {
    SignalStart(SpectrumValue),
    SignalEnd(SpectrumValue),
    RxStart { label: String, signal: SpectrumValue },
    RxEnd { label: String },
}

impl MediumEvent {
    pub fn rank(&self) -> u8 {
        match self {
            MediumEvent::SignalEnd(_) => 0,
            MediumEvent::RxEnd { .. } => 1,
            MediumEvent::SignalStart(_) => 2,
            MediumEvent::RxStart { .. } => 3,
        }
    }
}

#[derive(Debug)]
struct Scheduled {
    time: SimTime,
    rank: u8,
    seq: u64,
    event: MediumEvent,
}

impl Scheduled {
    fn key(&self) -> (SimTime, u8, u64) {
        (self.time, self.rank, self.seq)
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Scheduled {}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest (time, rank, seq) comes first
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending medium events
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: SimTime, event: MediumEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            time,
            rank: event.rank(),
            seq,
            event,
        });
    }

    pub fn pop(&mut self) -> Option<(SimTime, MediumEvent)> {
        self.heap.pop().map(|s| (s.time, s.event))
    }

    /// Next event without removing it
    pub fn peek(&self) -> Option<(SimTime, &MediumEvent)> {
        self.heap.peek().map(|s| (s.time, &s.event))
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|s| s.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specint_core::spectrum::SpectrumModel;

    fn sig(v: f64) -> SpectrumValue {
        SpectrumValue::constant(SpectrumModel::uniform(0.0, 1.0, 1), v)
    }

    #[test]
    fn test_pops_in_time_order() {
        let mut q = EventQueue::new();
        q.push(SimTime::from_secs(3), MediumEvent::SignalStart(sig(1.0)));
        q.push(SimTime::from_secs(1), MediumEvent::SignalStart(sig(2.0)));
        q.push(SimTime::from_secs(2), MediumEvent::SignalStart(sig(3.0)));
        let times: Vec<u64> = std::iter::from_fn(|| q.pop())
            .map(|(t, _)| t.as_secs_f64() as u64)
            .collect();
        assert_eq!(times, vec![1, 2, 3]);
    }

    #[test]
    fn test_removals_before_additions_at_same_instant() {
        let mut q = EventQueue::new();
        let t = SimTime::from_secs(5);
        q.push(t, MediumEvent::RxStart { label: "a".into(), signal: sig(1.0) });
        q.push(t, MediumEvent::SignalStart(sig(1.0)));
        q.push(t, MediumEvent::RxEnd { label: "b".into() });
        q.push(t, MediumEvent::SignalEnd(sig(2.0)));
        let ranks: Vec<u8> = std::iter::from_fn(|| q.pop()).map(|(_, e)| e.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_fifo_within_rank() {
        let mut q = EventQueue::new();
        let t = SimTime::from_secs(1);
        for v in [1.0, 2.0, 3.0] {
            q.push(t, MediumEvent::SignalStart(sig(v)));
        }
        assert_eq!(q.len(), 3);
        let order: Vec<f64> = std::iter::from_fn(|| q.pop())
            .map(|(_, e)| match e {
                MediumEvent::SignalStart(s) => s[0],
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0]);
        assert!(q.is_empty());
        assert_eq!(q.peek_time(), None);
    }
}
