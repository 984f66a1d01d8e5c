use std::time::Duration;

use crate::config::StopPolicy;
use crate::model::targets::TargetId;

/// Milliseconds on the frame clock (`performance.now()` on the web, time
/// since startup natively).
pub type Millis = f64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingStop {
    pub due_at: Millis,
    pub target: TargetId,
    pub animation_index: usize,
    seq: u64,
}

/// Deferred "stop this animation" actions, polled by the frame loop.
///
/// Under [`StopPolicy::Stack`] a stop is never cancelled once scheduled, so
/// repeated clicks leave several stops pending for the same clip.
#[derive(Debug, Default)]
pub struct StopScheduler {
    pending: Vec<PendingStop>,
    policy: StopPolicy,
    next_seq: u64,
}

impl StopScheduler {
    pub fn new(policy: StopPolicy) -> Self {
        Self { pending: Vec::new(), policy, next_seq: 0 }
    }

    pub fn schedule(&mut self, now: Millis, after: Duration, target: TargetId, animation_index: usize) -> Millis {
        if self.policy == StopPolicy::Replace {
            self.pending.retain(|p| p.target != target);
        }
        let due_at = now + after.as_secs_f64() * 1000.0;
        self.pending.push(PendingStop { due_at, target, animation_index, seq: self.next_seq });
        self.next_seq += 1;
        due_at
    }

    /// Removes and returns every stop due at or before `now`, earliest first.
    /// Stops due at the same instant come out in scheduling order.
    pub fn take_due(&mut self, now: Millis) -> Vec<PendingStop> {
        let (mut due, rest): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| p.due_at <= now);
        self.pending = rest;
        due.sort_by(|a, b| a.due_at.total_cmp(&b.due_at).then(a.seq.cmp(&b.seq)));
        due
    }

    pub fn pending(&self) -> &[PendingStop] {
        &self.pending
    }

    pub fn pending_for(&self, target: TargetId) -> usize {
        self.pending.iter().filter(|p| p.target == target).count()
    }
}
