//! The deskbot environment: episode lifecycle, reward model, observation
//! building, and [`DeskEnv`], the reset/step wrapper that owns a Bevy `App`
//! whose `Update` schedule runs one engine tick.

pub mod env;
pub mod episode;
pub mod observe;
pub mod plugin;
pub mod reward;

pub use env::DeskEnv;
pub use episode::{Episode, EpisodeState};
pub use observe::{build_observation, flatten, normalize};
pub use plugin::{DeskEnvPlugin, LastJudgement, PendingAction};
pub use reward::{Judgement, RewardModel};

/// Commonly used re-exports.
pub mod prelude {
    pub use crate::env::DeskEnv;
    pub use crate::episode::{Episode, EpisodeState};
    pub use crate::observe::{build_observation, flatten, normalize};
    pub use crate::plugin::DeskEnvPlugin;
    pub use crate::reward::{Judgement, RewardModel};
}
