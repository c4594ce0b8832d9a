//! The reset/step environment.
//!
//! [`DeskEnv`] owns a headless Bevy `App`; one `app.update()` is one control
//! tick. Policies drive it gym-style via [`DeskEnv::step`], command text goes
//! through [`DeskEnv::execute_command`], and a real-time host feeds wall-clock
//! deltas to [`DeskEnv::advance_frame`].

use std::time::Duration;

use bevy::app::App;
use bevy::math::Vec3;
use tracing::{debug, info};

use deskbot_calib::{Calibrator, RaycastCalibrator, StaticCalibrator};
use deskbot_control::{compile, parse, split_clauses, Gripper, TaskExecutor};
use deskbot_core::bounds::DeskBounds;
use deskbot_core::config::EngineConfig;
use deskbot_core::error::{CalibrationError, ValidationError};
use deskbot_core::seed::{derive_seed_indexed, episode_rng};
use deskbot_core::time::TickClock;
use deskbot_core::types::{Action, Observation, Shape, StepResult};
use deskbot_physics::PhysicsContext;
use deskbot_scene::{populate_desk, HeadlessVisuals, ObjectRegistry, Visuals};

use crate::episode::Episode;
use crate::observe::build_observation;
use crate::plugin::{DeskEnvPlugin, LastJudgement, PendingAction, WorldGeometry};
use crate::reward::{Judgement, RewardModel};

/// Physics ticks run after spawning so the first observation sees objects at
/// rest, not mid-drop.
const SETTLE_TICKS: u32 = 30;

/// Gripper spawn height above the calibrated surface.
const GRIPPER_START_HEIGHT: f32 = 0.4;

/// Build the static bodies for a world id. Unknown ids get the baseline
/// desk, mirroring the static calibration fallback.
///
/// There is no floor body: objects pushed past the edge fall clear of the
/// desk band, and the surface scan has exactly one horizontal surface to
/// find.
fn build_static_world(physics: &mut PhysicsContext, geometry: &mut WorldGeometry, world: u32) {
    let (half_extents, center_y) = match world {
        1 => ([0.55, 0.025, 0.35], 0.75),
        3 => ([0.5, 0.03, 0.38], 0.71),
        _ => ([0.6, 0.025, 0.4], 0.75),
    };
    let desk = physics.add_fixed(Vec3::new(0.0, center_y, 0.0), &Shape::Cuboid { half_extents });
    geometry.bodies.push(desk);
}

/// The autonomous manipulation environment.
pub struct DeskEnv {
    app: App,
    world_id: u32,
    auto_calibrate: bool,
    root_seed: u64,
}

impl DeskEnv {
    /// Build an environment for one world. Call [`reset`](Self::reset) before
    /// stepping; until then the episode is idle and steps score nothing.
    #[must_use]
    pub fn new(config: EngineConfig, world_id: u32, auto_calibrate: bool, root_seed: u64) -> Self {
        let mut app = App::new();
        #[allow(clippy::cast_possible_truncation)]
        let dt = config.control_dt as f32;

        app.insert_resource(PhysicsContext::new(Vec3::new(0.0, -config.gravity, 0.0), dt));
        app.insert_resource(ObjectRegistry::default());
        app.insert_resource(Visuals(Box::new(HeadlessVisuals::new())));
        app.insert_resource(Gripper::new(Vec3::new(0.0, 1.2, 0.0), config.gripper));
        app.insert_resource(TaskExecutor::new(config.executor));
        app.insert_resource(RewardModel::new(config.reward, config.zone_inset));
        app.insert_resource(Episode::new());
        app.insert_resource(DeskBounds::default());
        app.insert_resource(
            TickClock::new(config.control_dt).with_max_catch_up(config.max_steps_per_frame),
        );
        app.insert_resource(config);
        app.add_plugins(DeskEnvPlugin);

        Self {
            app,
            world_id,
            auto_calibrate,
            root_seed,
        }
    }

    /// Start a new episode: rebuild the static world, calibrate, spawn the
    /// desk layout, and return the first observation.
    pub fn reset(&mut self) -> Result<Observation, CalibrationError> {
        let world = self.app.world_mut();
        let config = world.resource::<EngineConfig>().clone();

        let mut physics = world.remove_resource::<PhysicsContext>().unwrap();
        let mut registry = world.remove_resource::<ObjectRegistry>().unwrap();
        let mut visuals = world.remove_resource::<Visuals>().unwrap();
        let mut geometry = world.remove_resource::<WorldGeometry>().unwrap();

        registry.clear(&mut physics, visuals.0.as_mut());
        for body in geometry.bodies.drain(..) {
            physics.remove_body(body);
        }
        build_static_world(&mut physics, &mut geometry, self.world_id);

        let calibration = if self.auto_calibrate {
            RaycastCalibrator::new(config.scan).calibrate(&physics)
        } else {
            StaticCalibrator::new(self.world_id).calibrate(&physics)
        };
        let bounds = match calibration {
            Ok(bounds) => bounds,
            Err(err) => {
                world.insert_resource(physics);
                world.insert_resource(registry);
                world.insert_resource(visuals);
                world.insert_resource(geometry);
                return Err(err);
            }
        };

        let episode_number = world.resource::<Episode>().episode_number() + 1;
        let seed = derive_seed_indexed(self.root_seed, episode_number);
        let mut rng = episode_rng(self.root_seed, episode_number);
        populate_desk(
            &mut registry,
            &mut physics,
            visuals.0.as_mut(),
            &bounds,
            &mut rng,
        );
        for _ in 0..SETTLE_TICKS {
            physics.step();
        }

        world.insert_resource(physics);
        world.insert_resource(registry);
        world.insert_resource(visuals);
        world.insert_resource(geometry);
        world.insert_resource(bounds);

        let start = bounds.center().with_y(bounds.surface_y() + GRIPPER_START_HEIGHT);
        world.insert_resource(Gripper::new(start, config.gripper));
        world.insert_resource(TaskExecutor::new(config.executor));
        world.resource_mut::<RewardModel>().reset();
        world.resource_mut::<Episode>().reset(seed);
        world.resource_mut::<TickClock>().reset();
        world.resource_mut::<PendingAction>().0 = None;
        world.resource_mut::<LastJudgement>().0 = Judgement::default();

        info!(
            world = self.world_id,
            episode = episode_number,
            seed,
            auto = self.auto_calibrate,
            "environment reset"
        );
        Ok(self.observation())
    }

    /// Run one control tick with the given action.
    ///
    /// Non-finite displacements are rejected before touching the simulation;
    /// finite ones are clamped to the per-axis limit.
    pub fn step(&mut self, action: Action) -> Result<StepResult, ValidationError> {
        action.validate()?;
        self.app
            .world_mut()
            .resource_mut::<PendingAction>()
            .0 = Some(action.clamped());
        self.app.update();

        let world = self.app.world();
        let judgement = world.resource::<LastJudgement>().0;
        let done = world.resource::<Episode>().is_done();
        Ok(StepResult {
            observation: self.observation(),
            reward: judgement.reward,
            done,
            info: judgement.info,
        })
    }

    /// Compile a natural-language command against the current scene and queue
    /// the resulting tasks. Returns how many tasks were queued; zero means no
    /// clause was understood or nothing matched.
    pub fn execute_command(&mut self, text: &str) -> usize {
        let world = self.app.world_mut();
        let snapshot = world
            .resource::<ObjectRegistry>()
            .snapshot(world.resource::<PhysicsContext>());
        let bounds = *world.resource::<DeskBounds>();
        let zone_inset = world.resource::<EngineConfig>().zone_inset;

        let mut queued = 0;
        for clause in split_clauses(text) {
            let intent = parse(&clause);
            let plan = compile(&intent, &snapshot, &bounds, zone_inset);
            debug!(%clause, ?intent, tasks = plan.len(), "compiled command clause");
            queued += plan.len();
            world.resource_mut::<TaskExecutor>().append_plan(plan);
        }
        queued
    }

    /// Tick with no-op actions until the executor drains its queue, the
    /// episode ends, or `max_ticks` is hit. Returns the ticks spent.
    pub fn run_until_idle(&mut self, max_ticks: u32) -> u32 {
        let mut ticks = 0;
        while ticks < max_ticks {
            {
                let world = self.app.world();
                if world.resource::<TaskExecutor>().is_idle()
                    || world.resource::<Episode>().is_done()
                {
                    break;
                }
            }
            if self.step(Action::default()).is_err() {
                break;
            }
            ticks += 1;
        }
        ticks
    }

    /// Feed a real frame delta; runs as many fixed ticks as the clock owes,
    /// up to the per-frame cap. Returns the ticks run.
    pub fn advance_frame(&mut self, delta: Duration) -> u32 {
        let mut clock = self.app.world_mut().remove_resource::<TickClock>().unwrap();
        clock.begin_frame(delta);
        let mut ticks = 0;
        while clock.try_step() {
            self.app.update();
            ticks += 1;
        }
        self.app.world_mut().insert_resource(clock);
        ticks
    }

    /// Ask the executor to stop: on its next tick it clears the queue and
    /// releases any held object.
    pub fn stop_tasks(&mut self) {
        self.app.world_mut().resource_mut::<TaskExecutor>().stop();
    }

    /// Fresh observation of the current state.
    #[must_use]
    pub fn observation(&self) -> Observation {
        let world = self.app.world();
        build_observation(
            world.resource::<ObjectRegistry>(),
            world.resource::<PhysicsContext>(),
            world.resource::<Gripper>().pose(),
            *world.resource::<DeskBounds>(),
        )
    }

    #[must_use]
    pub fn episode(&self) -> Episode {
        self.app.world().resource::<Episode>().clone()
    }

    #[must_use]
    pub fn bounds(&self) -> DeskBounds {
        *self.app.world().resource::<DeskBounds>()
    }

    #[must_use]
    pub fn is_executor_idle(&self) -> bool {
        self.app.world().resource::<TaskExecutor>().is_idle()
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.app.world().resource::<TaskExecutor>().pending_tasks()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
