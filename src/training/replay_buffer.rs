use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::ai::Observation;
use crate::game::Action;

/// One learner decision and its outcome.
#[derive(Debug, Clone)]
pub struct Transition {
    pub observation: Observation,
    pub action: Action,
    pub reward: f32,
    /// Absent once the learner has died.
    pub next_observation: Option<Observation>,
    pub done: bool,
}

/// Fixed-capacity ring buffer for storing training transitions.
pub struct ReplayBuffer {
    buffer: Vec<Transition>,
    capacity: usize,
    position: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        ReplayBuffer {
            buffer: Vec::with_capacity(capacity.min(4096)),
            capacity,
            position: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Add a transition. Overwrites the oldest when full.
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Sample a random batch without replacement.
    pub fn sample(&mut self, batch_size: usize) -> Vec<Transition> {
        assert!(batch_size <= self.len(), "Not enough transitions to sample");
        let len = self.len();
        let indices = index::sample(&mut self.rng, len, batch_size);
        indices.iter().map(|i| self.buffer[i].clone()).collect()
    }

    /// Drop every stored transition, e.g. after the arena size changed.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.position = 0;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_transition(reward: f32) -> Transition {
        let observation = Observation {
            width: 2,
            height: 2,
            pixels: vec![0; 12],
            heading: 0.0,
        };
        Transition {
            next_observation: Some(observation.clone()),
            observation,
            action: Action::Straight,
            reward,
            done: false,
        }
    }

    #[test]
    fn test_push_and_len() {
        let mut buf = ReplayBuffer::new(10);
        assert!(buf.is_empty());

        buf.push(dummy_transition(1.0));
        assert_eq!(buf.len(), 1);

        for _ in 0..9 {
            buf.push(dummy_transition(1.0));
        }
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn test_ring_buffer_overwrites_oldest() {
        let mut buf = ReplayBuffer::new(5);
        for i in 0..8 {
            buf.push(dummy_transition(i as f32));
        }
        assert_eq!(buf.len(), 5);
        let mut rewards: Vec<f32> = buf.sample(5).iter().map(|t| t.reward).collect();
        rewards.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(rewards, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_sample() {
        let mut buf = ReplayBuffer::new(100);
        for _ in 0..50 {
            buf.push(dummy_transition(1.0));
        }
        assert_eq!(buf.sample(10).len(), 10);
    }

    #[test]
    fn test_clear() {
        let mut buf = ReplayBuffer::new(4);
        for _ in 0..6 {
            buf.push(dummy_transition(1.0));
        }
        buf.clear();
        assert!(buf.is_empty());
        buf.push(dummy_transition(2.0));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    #[should_panic(expected = "Not enough transitions")]
    fn test_sample_too_many() {
        let mut buf = ReplayBuffer::new(10);
        buf.push(dummy_transition(1.0));
        buf.sample(5);
    }
}
