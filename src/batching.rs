//! Batch scheduling with pluggable epoch-boundary policies.
//!
//! Both training modes walk a cursor over the dataset in fixed-size
//! contiguous batches, but they disagree about what happens when the next
//! batch would overrun the end of the data:
//!
//! - [`BoundaryPolicy::TruncateTail`] (baseline training) resets the
//!   cursor and drops the remainder tail for that pass, so the last
//!   `N mod batch_size` samples of every epoch are skipped.
//! - [`BoundaryPolicy::DoubleStep`] (adversarial-mixed training) emits an
//!   immediate extra step on the tail slice before resetting, so epoch
//!   boundaries cost one extra optimizer step instead of dropping samples.
//!
//! Total steps are bounded by the caller's batch budget; epochs are an
//! emergent byproduct of dividing budget by dataset size.

use std::ops::Range;

/// Rule governing how a batch that would overflow the dataset end is
/// handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Skip the remainder tail of the pass and restart at the front.
    TruncateTail,
    /// Take an immediate extra step on the tail slice, then restart.
    DoubleStep,
}

/// One scheduler step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledBatch {
    /// The batch to train on for this step.
    pub primary: Range<usize>,
    /// Extra tail batch for an immediate second optimizer step
    /// (double-step policy only, at epoch boundaries). Does not consume
    /// budget.
    pub tail: Option<Range<usize>>,
    /// Whether this step crossed an epoch boundary (the cursor wrapped
    /// and the epoch counter was incremented).
    pub wrapped: bool,
}

/// Converts a dataset length plus batch size into a lazy sequence of
/// contiguous batches, tracking epoch boundaries.
#[derive(Debug)]
pub struct BatchScheduler {
    cursor: usize,
    epoch: usize,
    len: usize,
    batch_size: usize,
    policy: BoundaryPolicy,
}

impl BatchScheduler {
    /// Create a scheduler over `len` samples.
    ///
    /// # Panics
    /// Panics if `len` or `batch_size` is zero; both are validated by the
    /// configuration layer before a scheduler is built.
    #[must_use]
    pub fn new(len: usize, batch_size: usize, policy: BoundaryPolicy) -> Self {
        assert!(len > 0, "scheduler over an empty dataset");
        assert!(batch_size > 0, "zero batch size");
        Self {
            cursor: 0,
            epoch: 0,
            len,
            batch_size,
            policy,
        }
    }

    /// Emit the next batch and advance the cursor.
    pub fn next_batch(&mut self) -> ScheduledBatch {
        let j = self.cursor;
        let end = (j + self.batch_size).min(self.len);
        let primary = j..end;

        match self.policy {
            BoundaryPolicy::TruncateTail => {
                self.cursor += self.batch_size;
                if self.cursor + self.batch_size > self.len {
                    // The remainder tail [cursor, len) is never emitted
                    // for this pass.
                    self.cursor = 0;
                    self.epoch += 1;
                    ScheduledBatch {
                        primary,
                        tail: None,
                        wrapped: true,
                    }
                } else {
                    ScheduledBatch {
                        primary,
                        tail: None,
                        wrapped: false,
                    }
                }
            }
            BoundaryPolicy::DoubleStep => {
                if j + self.batch_size >= self.len {
                    // Last batch within this epoch: one extra step on the
                    // tail slice, however short.
                    self.cursor = 0;
                    self.epoch += 1;
                    ScheduledBatch {
                        primary,
                        tail: Some(j..self.len),
                        wrapped: true,
                    }
                } else {
                    self.cursor += self.batch_size;
                    ScheduledBatch {
                        primary,
                        tail: None,
                        wrapped: false,
                    }
                }
            }
        }
    }

    /// Number of completed passes over the dataset.
    #[must_use]
    pub fn epoch(&self) -> usize {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_epoch(scheduler: &mut BatchScheduler) -> Vec<ScheduledBatch> {
        let mut steps = Vec::new();
        loop {
            let step = scheduler.next_batch();
            let wrapped = step.wrapped;
            steps.push(step);
            if wrapped {
                return steps;
            }
        }
    }

    #[test]
    fn test_truncate_covers_all_but_tail_once() {
        // N=10, B=3: one epoch emits [0,3) [3,6) [6,9); [9,10) is skipped.
        let mut scheduler = BatchScheduler::new(10, 3, BoundaryPolicy::TruncateTail);
        let steps = collect_epoch(&mut scheduler);

        let ranges: Vec<_> = steps.iter().map(|s| s.primary.clone()).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..9]);
        assert!(steps.iter().all(|s| s.tail.is_none()));

        let covered: Vec<usize> = ranges.into_iter().flatten().collect();
        assert_eq!(covered, (0..9).collect::<Vec<_>>());
        assert_eq!(scheduler.epoch(), 1);
    }

    #[test]
    fn test_truncate_exact_division_covers_everything() {
        let mut scheduler = BatchScheduler::new(9, 3, BoundaryPolicy::TruncateTail);
        let steps = collect_epoch(&mut scheduler);
        let covered: Vec<usize> = steps.iter().flat_map(|s| s.primary.clone()).collect();
        assert_eq!(covered, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_truncate_scenario_100_30_10() {
        // N=100, B=30, budget=10: (30*10)/100 == 3 full wraps.
        let mut scheduler = BatchScheduler::new(100, 30, BoundaryPolicy::TruncateTail);
        let mut wraps = 0;
        for _ in 0..10 {
            let step = scheduler.next_batch();
            assert_eq!(step.primary.len(), 30);
            if step.wrapped {
                wraps += 1;
            }
        }
        assert_eq!(wraps, 3);
        assert_eq!(scheduler.epoch(), 3);
    }

    #[test]
    fn test_double_step_covers_everything_once() {
        // N=10, B=3: [0,3) [3,6) [6,9) then the boundary step [9,10) with
        // its extra tail. The union covers [0,10) exactly once.
        let mut scheduler = BatchScheduler::new(10, 3, BoundaryPolicy::DoubleStep);
        let steps = collect_epoch(&mut scheduler);

        let last = steps.last().unwrap();
        assert!(last.wrapped);
        assert_eq!(last.primary, 9..10);
        assert_eq!(last.tail, Some(9..10));

        let covered: Vec<usize> = steps.iter().flat_map(|s| s.primary.clone()).collect();
        assert_eq!(covered, (0..10).collect::<Vec<_>>());
        assert_eq!(scheduler.epoch(), 1);
    }

    #[test]
    fn test_double_step_exact_division() {
        // When B divides N the boundary step is a full batch, still with
        // the extra tail step over the same range.
        let mut scheduler = BatchScheduler::new(9, 3, BoundaryPolicy::DoubleStep);
        let steps = collect_epoch(&mut scheduler);
        assert_eq!(steps.len(), 3);
        let last = steps.last().unwrap();
        assert_eq!(last.primary, 6..9);
        assert_eq!(last.tail, Some(6..9));
    }

    #[test]
    fn test_double_step_exact_division_never_emits_empty_batch() {
        // The wrap fires on the last full batch of the pass, so the
        // cursor never reaches len and no empty slice is ever scheduled.
        let mut scheduler = BatchScheduler::new(9, 3, BoundaryPolicy::DoubleStep);
        for _ in 0..12 {
            let step = scheduler.next_batch();
            assert!(!step.primary.is_empty());
            if let Some(tail) = &step.tail {
                assert!(!tail.is_empty());
            }
        }
        assert_eq!(scheduler.epoch(), 4);
    }

    #[test]
    fn test_double_step_short_tail() {
        let mut scheduler = BatchScheduler::new(7, 3, BoundaryPolicy::DoubleStep);
        let steps = collect_epoch(&mut scheduler);
        let last = steps.last().unwrap();
        assert_eq!(last.primary, 6..7);
        assert_eq!(last.tail, Some(6..7));
        assert_eq!(last.primary.len(), 1);
    }

    #[test]
    fn test_epoch_increments_once_per_pass_both_policies() {
        for policy in [BoundaryPolicy::TruncateTail, BoundaryPolicy::DoubleStep] {
            let mut scheduler = BatchScheduler::new(10, 3, policy);
            for expected_epoch in 1..=4 {
                collect_epoch(&mut scheduler);
                assert_eq!(scheduler.epoch(), expected_epoch, "policy {policy:?}");
            }
        }
    }

    #[test]
    fn test_batch_size_larger_than_dataset() {
        let mut scheduler = BatchScheduler::new(4, 10, BoundaryPolicy::TruncateTail);
        let step = scheduler.next_batch();
        assert_eq!(step.primary, 0..4);
        assert!(step.wrapped);
        assert_eq!(scheduler.epoch(), 1);

        let mut scheduler = BatchScheduler::new(4, 10, BoundaryPolicy::DoubleStep);
        let step = scheduler.next_batch();
        assert_eq!(step.primary, 0..4);
        assert_eq!(step.tail, Some(0..4));
        assert!(step.wrapped);
    }

    #[test]
    fn test_truncate_second_epoch_restarts_at_front() {
        let mut scheduler = BatchScheduler::new(10, 3, BoundaryPolicy::TruncateTail);
        collect_epoch(&mut scheduler);
        let step = scheduler.next_batch();
        assert_eq!(step.primary, 0..3);
    }
}
