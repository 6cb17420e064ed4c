use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Result of a single training episode, from the learner's side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeResult {
    pub total_reward: f32,
    pub decisions: u32,
    /// The learner was still alive when the episode ended (e.g. at the decision cap).
    pub survived: bool,
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    update_losses: VecDeque<f32>,
    capacity: usize,
    reward_history: Vec<f32>, // every episode, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            update_losses: VecDeque::with_capacity(capacity),
            capacity,
            reward_history: Vec::new(),
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Start from a reward history restored from a checkpoint.
    pub fn with_history(history: Vec<f32>) -> Self {
        TrainingMetrics {
            reward_history: history,
            ..Self::new()
        }
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.reward_history.push(result.total_reward);
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    pub fn record_update(&mut self, loss: f32) {
        self.update_losses.push_back(loss);
        if self.update_losses.len() > self.capacity {
            self.update_losses.pop_front();
        }
    }

    fn recent(&self, last_n: usize) -> impl Iterator<Item = &EpisodeResult> {
        self.episode_results.iter().rev().take(last_n)
    }

    fn window(&self, last_n: usize) -> usize {
        self.episode_results.len().min(last_n)
    }

    /// Mean total reward over the last N episodes.
    pub fn mean_reward(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        self.recent(n).map(|r| r.total_reward).sum::<f32>() / n as f32
    }

    /// Mean number of learner decisions over the last N episodes.
    pub fn mean_decisions(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        self.recent(n).map(|r| r.decisions as f32).sum::<f32>() / n as f32
    }

    /// Average loss over the last N updates.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.update_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.update_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    /// Total reward of every episode recorded so far, oldest first.
    pub fn reward_history(&self) -> &[f32] {
        &self.reward_history
    }

    pub fn total_episodes(&self) -> usize {
        self.reward_history.len()
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Throughput tracker for the training loop.
pub struct TimingMetrics {
    episode_micros: VecDeque<u32>, // per-episode simulation µs
    capacity: usize,
    window_start: Instant,
    window_count: usize,
    window_overhead_micros: u128, // eval/checkpoint time excluded from throughput
}

impl TimingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TimingMetrics {
            episode_micros: VecDeque::with_capacity(capacity),
            capacity,
            window_start: Instant::now(),
            window_count: 0,
            window_overhead_micros: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode_time(&mut self, d: Duration) {
        self.episode_micros.push_back(d.as_micros() as u32);
        if self.episode_micros.len() > self.capacity {
            self.episode_micros.pop_front();
        }
        self.window_count += 1;
    }

    /// Record time spent in evaluation or checkpoint saving so it is excluded
    /// from the throughput window.
    pub fn record_overhead(&mut self, d: Duration) {
        self.window_overhead_micros += d.as_micros();
    }

    /// Mean of the last `last_n` episode times in milliseconds.
    pub fn avg_episode_ms(&self, last_n: usize) -> f32 {
        let n = self.episode_micros.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let mean = self
            .episode_micros
            .iter()
            .rev()
            .take(n)
            .map(|&v| v as f64)
            .sum::<f64>()
            / n as f64;
        (mean / 1000.0) as f32
    }

    /// Episodes per second since the last `reset_window` call.
    pub fn episodes_per_sec(&self) -> f32 {
        let total_micros = self.window_start.elapsed().as_micros();
        let net_micros = total_micros.saturating_sub(self.window_overhead_micros);
        if net_micros == 0 {
            return 0.0;
        }
        self.window_count as f32 / (net_micros as f32 / 1_000_000.0)
    }

    pub fn reset_window(&mut self) {
        self.window_start = Instant::now();
        self.window_count = 0;
        self.window_overhead_micros = 0;
    }
}

impl Default for TimingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(total_reward: f32, decisions: u32) -> EpisodeResult {
        EpisodeResult {
            total_reward,
            decisions,
            survived: false,
        }
    }

    #[test]
    fn test_mean_reward_window() {
        let mut m = TrainingMetrics::new();
        for r in [10.0, 20.0, 30.0, 40.0] {
            m.record_episode(result(r, r as u32));
        }
        assert!((m.mean_reward(2) - 35.0).abs() < 1e-6);
        assert!((m.mean_reward(100) - 25.0).abs() < 1e-6);
        assert!((m.mean_decisions(1) - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let m = TrainingMetrics::new();
        assert_eq!(m.mean_reward(10), 0.0);
        assert_eq!(m.mean_decisions(10), 0.0);
        assert_eq!(m.average_loss(10), 0.0);
    }

    #[test]
    fn test_history_is_not_capped() {
        let mut m = TrainingMetrics::with_capacity(3);
        for i in 0..10 {
            m.record_episode(result(i as f32, 1));
        }
        assert_eq!(m.reward_history().len(), 10);
        assert_eq!(m.total_episodes(), 10);
        assert!((m.mean_reward(100) - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_with_history_continues() {
        let mut m = TrainingMetrics::with_history(vec![1.0, 2.0]);
        m.record_episode(result(3.0, 3));
        assert_eq!(m.reward_history(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_average_loss() {
        let mut m = TrainingMetrics::new();
        m.record_update(1.0);
        m.record_update(3.0);
        assert!((m.average_loss(10) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_timing_avg_episode_ms_last_n() {
        let mut t = TimingMetrics::new();
        t.record_episode_time(Duration::from_micros(1000));
        t.record_episode_time(Duration::from_micros(9000));
        t.record_episode_time(Duration::from_micros(5000));
        assert!((t.avg_episode_ms(1) - 5.0).abs() < 1e-3);
        assert!((t.avg_episode_ms(100) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_overhead_excluded_from_eps_per_sec() {
        let mut t = TimingMetrics::new();
        for _ in 0..10 {
            t.record_episode_time(Duration::from_micros(1000));
        }
        t.record_overhead(Duration::from_secs(9999));
        assert_eq!(t.episodes_per_sec(), 0.0);

        t.reset_window();
        t.record_episode_time(Duration::from_micros(1000));
        std::thread::sleep(Duration::from_millis(5));
        assert!(t.episodes_per_sec() > 0.0);
    }
}
