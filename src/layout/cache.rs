use super::month::{assign_lanes_with, LaneAssignment, WeekWindow};
use crate::model::{LanePolicy, Span};
use log::trace;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

/// Small LRU over week lane assignments, keyed on a hash of the span list,
/// the window and the lane policy. Capacity 0 disables caching.
#[derive(Debug)]
pub struct LayoutCache {
    capacity: usize,
    entries: VecDeque<(u64, Vec<LaneAssignment>)>,
    hits: u64,
    misses: u64,
}

impl LayoutCache {
    pub fn new(capacity: usize) -> Self {
        LayoutCache {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn week_lanes(
        &mut self,
        spans: &[Span],
        window: &WeekWindow,
        policy: LanePolicy,
    ) -> Vec<LaneAssignment> {
        let key = cache_key(spans, window, policy);
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.hits += 1;
            if let Some(entry) = self.entries.remove(pos) {
                let lanes = entry.1.clone();
                self.entries.push_back(entry);
                return lanes;
            }
        }

        self.misses += 1;
        let lanes = assign_lanes_with(spans, window, policy);
        if self.capacity > 0 {
            if self.entries.len() >= self.capacity {
                self.entries.pop_front();
            }
            self.entries.push_back((key, lanes.clone()));
        }
        trace!("layout cache miss ({} entries)", self.entries.len());
        lanes
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        LayoutCache::new(32)
    }
}

fn cache_key(spans: &[Span], window: &WeekWindow, policy: LanePolicy) -> u64 {
    let mut hasher = DefaultHasher::new();
    spans.hash(&mut hasher);
    window.hash(&mut hasher);
    policy.hash(&mut hasher);
    hasher.finish()
}
