//! The engine tick as a chain of Bevy systems.
//!
//! One `Update` run of the schedule is one control step: consume the pending
//! policy action, advance the task executor, pin any carried object, step
//! physics, push transforms to the visual backend, then score the step.

use bevy::prelude::{App, IntoSystemConfigs, Plugin, Res, ResMut, Resource, Update};

use deskbot_core::bounds::DeskBounds;
use deskbot_core::config::EngineConfig;
use deskbot_core::types::{Action, GraspCommand};
use deskbot_control::{Gripper, TaskExecutor};
use deskbot_physics::{PhysicsContext, RigidBodyHandle};
use deskbot_scene::{sync_visuals, ObjectRegistry, Visuals};

use crate::episode::Episode;
use crate::reward::{Judgement, RewardModel};

// ---------------------------------------------------------------------------
// Tick resources
// ---------------------------------------------------------------------------

/// Policy action waiting to be consumed by the next tick. Taken, not copied,
/// so a tick without a fresh action is a no-op for the gripper.
#[derive(Resource, Default)]
pub struct PendingAction(pub Option<Action>);

/// Judgement produced by the most recent tick.
#[derive(Resource, Default)]
pub struct LastJudgement(pub Judgement);

/// Static bodies (desk, fixtures) rebuilt on every reset.
#[derive(Resource, Default)]
pub struct WorldGeometry {
    pub bodies: Vec<RigidBodyHandle>,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn apply_action(
    mut pending: ResMut<PendingAction>,
    mut gripper: ResMut<Gripper>,
    registry: Res<ObjectRegistry>,
    mut physics: ResMut<PhysicsContext>,
) {
    let Some(action) = pending.0.take() else {
        return;
    };
    gripper.apply_delta(action.delta());
    match action.grasp {
        GraspCommand::None => {}
        GraspCommand::Grasp(id) => {
            gripper.grasp(&registry, &mut physics, Some(id));
        }
        GraspCommand::Release => {
            gripper.release(&mut physics);
        }
    }
}

fn run_executor(
    mut executor: ResMut<TaskExecutor>,
    mut gripper: ResMut<Gripper>,
    registry: Res<ObjectRegistry>,
    mut physics: ResMut<PhysicsContext>,
    config: Res<EngineConfig>,
) {
    #[allow(clippy::cast_possible_truncation)]
    let dt = config.control_dt as f32;
    executor.tick(&mut gripper, &registry, &mut physics, dt);
}

fn sync_carry(gripper: Res<Gripper>, mut physics: ResMut<PhysicsContext>) {
    gripper.carry_sync(&mut physics);
}

fn step_physics(mut physics: ResMut<PhysicsContext>) {
    physics.step();
}

fn push_visuals(
    registry: Res<ObjectRegistry>,
    physics: Res<PhysicsContext>,
    mut visuals: ResMut<Visuals>,
) {
    sync_visuals(&registry, &physics, visuals.0.as_mut());
}

fn score(
    registry: Res<ObjectRegistry>,
    physics: Res<PhysicsContext>,
    gripper: Res<Gripper>,
    bounds: Res<DeskBounds>,
    config: Res<EngineConfig>,
    mut reward: ResMut<RewardModel>,
    mut episode: ResMut<Episode>,
    mut last: ResMut<LastJudgement>,
) {
    if !episode.is_running() {
        return;
    }
    let snapshot = registry.snapshot(&physics);
    let mut judgement = reward.judge(&snapshot, &gripper.pose(), &bounds);
    episode.advance(judgement.reward);
    if judgement.terminal {
        episode.terminate();
    } else if episode.check_truncation(config.max_episode_steps) {
        judgement.info.timeout = true;
    }
    last.0 = judgement;
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Installs the tick systems. The environment inserts the configured
/// resources before adding this plugin.
pub struct DeskEnvPlugin;

impl Plugin for DeskEnvPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingAction>();
        app.init_resource::<LastJudgement>();
        app.init_resource::<WorldGeometry>();
        app.add_systems(
            Update,
            (
                apply_action,
                run_executor,
                sync_carry,
                step_physics,
                push_visuals,
                score,
            )
                .chain(),
        );
    }
}
