use crate::model::AdvanceMode;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::fmt;

pub trait ShuffleSource: fmt::Debug {
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

pub struct RandomShuffle {
    rng: SmallRng,
}

impl RandomShuffle {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomShuffle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RandomShuffle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RandomShuffle")
    }
}

impl ShuffleSource for RandomShuffle {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.rng);
        order
    }
}

#[derive(Debug, Default)]
pub struct FixedShuffle {
    bags: VecDeque<Vec<usize>>,
}

impl FixedShuffle {
    pub fn new(bags: impl IntoIterator<Item = Vec<usize>>) -> Self {
        Self {
            bags: bags.into_iter().collect(),
        }
    }
}

impl ShuffleSource for FixedShuffle {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        match self.bags.pop_front() {
            Some(bag) if bag.len() == len && bag.iter().all(|idx| *idx < len) => bag,
            _ => (0..len).collect(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShuffleBag {
    order: VecDeque<usize>,
}

impl ShuffleBag {
    pub fn reseed(&mut self, len: usize, source: &mut dyn ShuffleSource) {
        self.order = source.permutation(len).into_iter().collect();
    }

    pub fn draw(&mut self, len: usize, source: &mut dyn ShuffleSource) -> Option<usize> {
        if len == 0 {
            return None;
        }
        if self.order.is_empty() {
            self.reseed(len, source);
        }
        self.order.pop_front()
    }

    pub fn remaining(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

pub struct Resolver<'a> {
    pub mode: AdvanceMode,
    pub playing: Option<usize>,
    pub track_count: usize,
    pub explicit_queue: &'a VecDeque<usize>,
    pub bag: &'a mut ShuffleBag,
    pub source: &'a mut dyn ShuffleSource,
}

impl Resolver<'_> {
    /// Index that plays when the current track ends. The explicit queue is
    /// peeked, never popped; shuffle mode consumes one bag entry.
    pub fn resolve(self) -> Option<usize> {
        if self.track_count == 0 {
            return None;
        }
        if let Some(front) = self.explicit_queue.front() {
            return Some(*front);
        }

        match self.mode {
            AdvanceMode::Shuffle => self.bag.draw(self.track_count, self.source),
            AdvanceMode::Normal => Some(
                self.playing
                    .map_or(0, |current| (current + 1) % self.track_count),
            ),
            AdvanceMode::Loop => Some(self.playing.unwrap_or(0)),
        }
    }
}
