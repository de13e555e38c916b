//! Bounded recent-history buffer of samples

use std::collections::vec_deque::{self, VecDeque};

use super::sample::Sample;

/// Default amount of samples kept for the live statistics
pub const DEFAULT_WINDOW_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct SampleWindow {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl SampleWindow {
    /// New empty window. The capacity is never lower than one pair
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity < 2 { 2 } else { capacity };

        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Append the newest sample, evicting the oldest one on overflow
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        self.samples.push_back(sample);

        if self.samples.len() > self.capacity {
            return self.samples.pop_front();
        }

        None
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Consecutive pairs, oldest first
    pub fn pairs(&self) -> impl Iterator<Item = (&Sample, &Sample)> + '_ {
        self.samples.iter().zip(self.samples.iter().skip(1))
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}
