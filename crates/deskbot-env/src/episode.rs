//! Episode bookkeeping.

use bevy::prelude::Resource;

/// Lifecycle of one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeState {
    /// No episode started yet.
    #[default]
    Idle,
    /// Accepting steps.
    Running,
    /// Terminated by the task outcome (success or a fatal failure).
    Done,
    /// Cut off at the step limit.
    Truncated,
}

/// Step counter, reward accumulator, and terminal state for the current
/// episode. Reset derives a fresh per-episode seed upstream; the episode
/// only records it.
#[derive(Resource, Debug, Clone)]
pub struct Episode {
    state: EpisodeState,
    step_count: u32,
    total_reward: f32,
    episode_number: u64,
    seed: u64,
}

impl Default for Episode {
    fn default() -> Self {
        Self::new()
    }
}

impl Episode {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: EpisodeState::Idle,
            step_count: 0,
            total_reward: 0.0,
            episode_number: 0,
            seed: 0,
        }
    }

    /// Start a new episode. The episode number increments monotonically
    /// across resets and never repeats within one environment.
    pub fn reset(&mut self, seed: u64) {
        self.episode_number += 1;
        self.step_count = 0;
        self.total_reward = 0.0;
        self.seed = seed;
        self.state = EpisodeState::Running;
    }

    /// Record one step's reward. Ignored unless the episode is running.
    pub fn advance(&mut self, reward: f32) -> bool {
        if self.state != EpisodeState::Running {
            return false;
        }
        self.step_count += 1;
        self.total_reward += reward;
        true
    }

    /// Terminal stop: success, or a fatal failure like the gripper leaving
    /// the workspace.
    pub fn terminate(&mut self) {
        if self.state == EpisodeState::Running {
            self.state = EpisodeState::Done;
        }
    }

    /// Truncate if the step limit has been reached. Returns true when the
    /// truncation happened on this call.
    pub fn check_truncation(&mut self, max_steps: u32) -> bool {
        if self.state == EpisodeState::Running && self.step_count >= max_steps {
            self.state = EpisodeState::Truncated;
            return true;
        }
        false
    }

    #[must_use]
    pub fn state(&self) -> EpisodeState {
        self.state
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.state, EpisodeState::Done | EpisodeState::Truncated)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == EpisodeState::Running
    }

    #[must_use]
    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    #[must_use]
    pub fn total_reward(&self) -> f32 {
        self.total_reward
    }

    #[must_use]
    pub fn episode_number(&self) -> u64 {
        self.episode_number
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_and_rejects_steps() {
        let mut ep = Episode::new();
        assert_eq!(ep.state(), EpisodeState::Idle);
        assert!(!ep.advance(1.0));
        assert_eq!(ep.step_count(), 0);
    }

    #[test]
    fn reset_increments_episode_number() {
        let mut ep = Episode::new();
        ep.reset(7);
        assert_eq!(ep.episode_number(), 1);
        assert_eq!(ep.seed(), 7);
        assert!(ep.is_running());

        ep.advance(-1.0);
        ep.reset(9);
        assert_eq!(ep.episode_number(), 2);
        assert_eq!(ep.step_count(), 0);
        assert_eq!(ep.total_reward(), 0.0);
    }

    #[test]
    fn advance_accumulates() {
        let mut ep = Episode::new();
        ep.reset(1);
        assert!(ep.advance(-1.0));
        assert!(ep.advance(99.0));
        assert_eq!(ep.step_count(), 2);
        assert_eq!(ep.total_reward(), 98.0);
    }

    #[test]
    fn terminate_stops_accumulation() {
        let mut ep = Episode::new();
        ep.reset(1);
        ep.advance(1.0);
        ep.terminate();
        assert_eq!(ep.state(), EpisodeState::Done);
        assert!(ep.is_done());
        assert!(!ep.advance(1.0));
        assert_eq!(ep.total_reward(), 1.0);
    }

    #[test]
    fn truncates_at_step_limit() {
        let mut ep = Episode::new();
        ep.reset(1);
        for _ in 0..5 {
            ep.advance(-1.0);
        }
        assert!(!ep.check_truncation(6));
        ep.advance(-1.0);
        assert!(ep.check_truncation(6));
        assert_eq!(ep.state(), EpisodeState::Truncated);
        assert!(!ep.check_truncation(6));
    }
}
