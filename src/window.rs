//! Bounded FIFO history of rotation samples.

use std::{collections::VecDeque, time::Duration};

use crate::RotationSample;

/// A fixed-capacity window over the most recent samples.
///
/// Pushing into a full window evicts the oldest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow {
    capacity: usize,
    samples: VecDeque<RotationSample>,
}

impl SlidingWindow {
    /// Creates an empty window holding at most `capacity` samples.
    ///
    /// A capacity of `0` is rounded up to `1`; [`crate::ResetParameters`]
    /// rejects it before it gets here.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends `sample`, returning the evicted sample if the window was full.
    pub fn push(&mut self, sample: RotationSample) -> Option<RotationSample> {
        let evicted = if self.is_full() {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Maximum number of samples.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the window holds `capacity` samples.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// Iterates the samples from oldest to newest.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, RotationSample> {
        self.samples.iter()
    }

    /// Copies the samples, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RotationSample> {
        self.samples.iter().copied().collect()
    }

    /// Sum of the `dt` of all samples in the window.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        let seconds = self.samples.iter().map(|s| s.dt).sum::<f64>();
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }

    /// Removes every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl<'a> IntoIterator for &'a SlidingWindow {
    type Item = &'a RotationSample;
    type IntoIter = std::collections::vec_deque::Iter<'a, RotationSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
