//! Task executor state machine.
//!
//! Consumes a [`TaskPlan`] one task at a time, driving the gripper through
//! the pick-and-place phases. Failure handling is local: unreachable grasps
//! and stuck transport abandon the current task and move on, they never
//! surface as errors.

use bevy::prelude::{Resource, Vec3};
use tracing::{debug, warn};

use deskbot_core::config::ExecutorConfig;
use deskbot_physics::PhysicsContext;
use deskbot_scene::ObjectRegistry;

use crate::compiler::TaskPlan;
use crate::gripper::Gripper;

/// Phase of the current task.
///
/// `Lift` and `Lower` are pass-throughs: transport happens at pickup height,
/// so they exist only to keep the phase sequence stable for telemetry and
/// future height profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskPhase {
    #[default]
    Idle,
    Approach,
    Grasp,
    Lift,
    Transport,
    Lower,
    Release,
    Retreat,
}

/// Sequential pick-and-place executor.
#[derive(Resource)]
pub struct TaskExecutor {
    queue: TaskPlan,
    phase: TaskPhase,
    grasp_attempts: u32,
    carry_height: f32,
    stuck_time: f32,
    last_position: Option<Vec3>,
    stop_requested: bool,
    config: ExecutorConfig,
}

impl TaskExecutor {
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            queue: TaskPlan::default(),
            phase: TaskPhase::Idle,
            grasp_attempts: 0,
            carry_height: 0.0,
            stuck_time: 0.0,
            last_position: None,
            stop_requested: false,
            config,
        }
    }

    /// Replace the queue and restart from idle.
    pub fn set_plan(&mut self, plan: TaskPlan) {
        self.queue = plan;
        self.phase = TaskPhase::Idle;
        self.reset_watchdogs();
    }

    /// Append tasks behind the current queue.
    pub fn append_plan(&mut self, plan: TaskPlan) {
        self.queue.append(plan);
    }

    #[must_use]
    pub const fn phase(&self) -> TaskPhase {
        self.phase
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    /// No current task and nothing queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.phase == TaskPhase::Idle && self.queue.is_empty()
    }

    /// Cooperative stop: on the next tick the queue is cleared and any held
    /// object released.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    fn reset_watchdogs(&mut self) {
        self.grasp_attempts = 0;
        self.stuck_time = 0.0;
        self.last_position = None;
    }

    /// Drop the current task, releasing anything held.
    fn abandon(&mut self, gripper: &mut Gripper, physics: &mut PhysicsContext) {
        if gripper.is_grasping() {
            gripper.release(physics);
        }
        self.queue.pop_front();
        self.phase = TaskPhase::Idle;
        self.reset_watchdogs();
    }

    /// Advance the state machine by one tick.
    pub fn tick(
        &mut self,
        gripper: &mut Gripper,
        registry: &ObjectRegistry,
        physics: &mut PhysicsContext,
        dt: f32,
    ) {
        if self.stop_requested {
            self.stop_requested = false;
            self.queue.clear();
            if gripper.is_grasping() {
                gripper.release(physics);
            }
            self.phase = TaskPhase::Idle;
            self.reset_watchdogs();
            debug!("executor stopped");
            return;
        }

        // Global stuck watchdog: while a task is active, a gripper that has
        // not moved for too long means the target is unreachable.
        if self.phase != TaskPhase::Idle {
            let position = gripper.position();
            if let Some(last) = self.last_position {
                if (position - last).length() < self.config.stuck_eps {
                    self.stuck_time += dt;
                    if self.stuck_time > self.config.stuck_timeout {
                        warn!(phase = ?self.phase, "gripper stuck, abandoning task");
                        self.abandon(gripper, physics);
                        return;
                    }
                } else {
                    self.stuck_time = 0.0;
                }
            }
            self.last_position = Some(position);
        }

        match self.phase {
            TaskPhase::Idle => {
                let Some(task) = self.queue.front() else {
                    return;
                };
                // Tasks for vanished objects are discarded, not retried.
                if !registry.contains(task.object) {
                    debug!(object = %task.object, "task references unknown object, discarding");
                    self.queue.pop_front();
                    return;
                }
                self.phase = TaskPhase::Approach;
                self.reset_watchdogs();
            }

            TaskPhase::Approach => {
                let Some(target) = self.current_object_position(registry, physics) else {
                    self.abandon(gripper, physics);
                    return;
                };
                // Track the object's live position; it may still be settling.
                let approach = target + Vec3::Y * self.config.approach_height;
                if gripper.move_toward(approach, dt) {
                    self.phase = TaskPhase::Grasp;
                    self.grasp_attempts = 0;
                }
            }

            TaskPhase::Grasp => {
                let Some(task) = self.queue.front() else {
                    self.phase = TaskPhase::Idle;
                    return;
                };
                if gripper.grasp(registry, physics, Some(task.object)) {
                    self.carry_height = gripper.position().y;
                    self.phase = TaskPhase::Lift;
                } else {
                    self.grasp_attempts += 1;
                    if self.grasp_attempts >= self.config.grasp_retry_ticks {
                        warn!(object = %task.object, "grasp failed repeatedly, abandoning task");
                        self.abandon(gripper, physics);
                    }
                }
            }

            TaskPhase::Lift => {
                self.phase = TaskPhase::Transport;
            }

            TaskPhase::Transport => {
                let Some(task) = self.queue.front() else {
                    self.phase = TaskPhase::Idle;
                    return;
                };
                let destination = Vec3::new(task.target.x, self.carry_height, task.target.z);
                if gripper.move_toward(destination, dt) {
                    self.phase = TaskPhase::Lower;
                }
            }

            TaskPhase::Lower => {
                self.phase = TaskPhase::Release;
            }

            TaskPhase::Release => {
                gripper.release(physics);
                self.phase = TaskPhase::Retreat;
            }

            TaskPhase::Retreat => {
                self.queue.pop_front();
                self.phase = TaskPhase::Idle;
                self.reset_watchdogs();
            }
        }
    }

    fn current_object_position(
        &self,
        registry: &ObjectRegistry,
        physics: &PhysicsContext,
    ) -> Option<Vec3> {
        let task = self.queue.front()?;
        let object = registry.get(task.object)?;
        physics.translation(object.body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use deskbot_core::config::GripperConfig;
    use deskbot_core::types::{ColorTag, ObjectId, ObjectKind, Shape};
    use deskbot_physics::DynamicOptions;
    use deskbot_scene::{HeadlessVisuals, VisualBackend};

    use crate::compiler::PickPlaceTask;

    const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);
    const DT: f32 = 1.0 / 60.0;

    struct Rig {
        executor: TaskExecutor,
        gripper: Gripper,
        registry: ObjectRegistry,
        physics: PhysicsContext,
        visuals: HeadlessVisuals,
    }

    impl Rig {
        fn new() -> Self {
            let mut physics = PhysicsContext::new(GRAVITY, DT);
            // Desk top at 0.775 plus a floor.
            physics.add_fixed(
                Vec3::new(0.0, 0.75, 0.0),
                &Shape::Cuboid {
                    half_extents: [0.6, 0.025, 0.4],
                },
            );
            physics.add_fixed(
                Vec3::new(0.0, -0.01, 0.0),
                &Shape::Cuboid {
                    half_extents: [5.0, 0.01, 5.0],
                },
            );
            Self {
                executor: TaskExecutor::new(ExecutorConfig::default()),
                gripper: Gripper::new(Vec3::new(0.0, 1.2, 0.0), GripperConfig::default()),
                registry: ObjectRegistry::default(),
                physics,
                visuals: HeadlessVisuals::new(),
            }
        }

        fn add_object(&mut self, position: Vec3) -> ObjectId {
            let shape = Shape::Sphere { radius: 0.03 };
            let body = self.physics.add_dynamic(
                position,
                &shape,
                DynamicOptions {
                    lock_rotations: true,
                    ..DynamicOptions::default()
                },
            );
            let visual = self
                .visuals
                .instantiate_primitive(&shape, ColorTag::Neutral);
            self.registry
                .register(ObjectKind::Trash, ColorTag::Neutral, shape, body, visual)
        }

        fn run(&mut self, ticks: usize) {
            for _ in 0..ticks {
                self.executor
                    .tick(&mut self.gripper, &self.registry, &mut self.physics, DT);
                self.gripper.carry_sync(&mut self.physics);
                self.physics.step();
                if self.executor.is_idle() {
                    break;
                }
            }
        }
    }

    #[test]
    fn completes_a_pick_and_place_task() {
        let mut rig = Rig::new();
        let id = rig.add_object(Vec3::new(0.2, 0.81, 0.1));
        let target = Vec3::new(-0.4, 0.83, -0.2);
        rig.executor.set_plan(vec![PickPlaceTask { object: id, target }].into());

        rig.run(2000);
        assert!(rig.executor.is_idle());
        assert!(!rig.gripper.is_grasping());

        // Let the released object settle.
        for _ in 0..120 {
            rig.physics.step();
        }
        let body = rig.registry.get(id).unwrap().body;
        let pos = rig.physics.translation(body).unwrap();
        assert!(
            (Vec3::new(pos.x, 0.0, pos.z) - Vec3::new(target.x, 0.0, target.z)).length() < 0.1,
            "object ended at {pos:?}, wanted near {target:?}"
        );
    }

    #[test]
    fn executes_tasks_in_order() {
        let mut rig = Rig::new();
        let a = rig.add_object(Vec3::new(0.2, 0.81, 0.1));
        let b = rig.add_object(Vec3::new(-0.2, 0.81, -0.1));
        let plan: TaskPlan = vec![
            PickPlaceTask {
                object: a,
                target: Vec3::new(0.4, 0.83, 0.3),
            },
            PickPlaceTask {
                object: b,
                target: Vec3::new(-0.4, 0.83, 0.3),
            },
        ]
        .into();
        rig.executor.set_plan(plan);
        assert_eq!(rig.executor.pending_tasks(), 2);

        rig.run(4000);
        assert!(rig.executor.is_idle());
        assert_eq!(rig.executor.pending_tasks(), 0);
    }

    #[test]
    fn task_for_unknown_object_is_discarded() {
        let mut rig = Rig::new();
        let live = rig.add_object(Vec3::new(0.1, 0.81, 0.0));
        let plan: TaskPlan = vec![
            PickPlaceTask {
                object: ObjectId(999),
                target: Vec3::new(0.4, 0.83, 0.0),
            },
            PickPlaceTask {
                object: live,
                target: Vec3::new(-0.4, 0.83, 0.0),
            },
        ]
        .into();
        rig.executor.set_plan(plan);

        // One tick discards the dead task without touching the gripper.
        rig.executor
            .tick(&mut rig.gripper, &rig.registry, &mut rig.physics, DT);
        assert_eq!(rig.executor.pending_tasks(), 1);
        assert_eq!(rig.executor.phase(), TaskPhase::Idle);

        rig.run(2000);
        assert!(rig.executor.is_idle());
    }

    #[test]
    fn grasp_retry_gives_up_and_moves_on() {
        let mut rig = Rig::new();
        let id = rig.add_object(Vec3::new(0.1, 0.81, 0.0));
        rig.executor.set_plan(
            vec![PickPlaceTask {
                object: id,
                target: Vec3::new(-0.4, 0.83, 0.0),
            }]
            .into(),
        );

        // Approach normally.
        let mut ticks = 0;
        while rig.executor.phase() != TaskPhase::Grasp && ticks < 1000 {
            rig.executor
                .tick(&mut rig.gripper, &rig.registry, &mut rig.physics, DT);
            rig.physics.step();
            ticks += 1;
        }
        assert_eq!(rig.executor.phase(), TaskPhase::Grasp);

        // Teleport the object out of grasp range; every attempt now fails.
        let body = rig.registry.get(id).unwrap().body;
        rig.physics.set_translation(body, Vec3::new(3.0, 0.81, 3.0));
        rig.physics.zero_velocity(body);

        for _ in 0..=ExecutorConfig::default().grasp_retry_ticks {
            rig.executor
                .tick(&mut rig.gripper, &rig.registry, &mut rig.physics, DT);
        }
        assert!(rig.executor.is_idle(), "task should be abandoned");
        assert!(!rig.gripper.is_grasping());
    }

    #[test]
    fn stuck_gripper_abandons_and_continues_with_next_task() {
        let mut rig = Rig::new();
        // First object far below the floor clamp: the approach point is
        // unreachable, so the gripper jams at the floor.
        let below = rig.add_object(Vec3::new(0.3, -5.0, 0.0));
        let body = rig.registry.get(below).unwrap().body;
        rig.physics.set_kinematic(body); // hold it down there

        let reachable = rig.add_object(Vec3::new(-0.2, 0.81, 0.1));
        let plan: TaskPlan = vec![
            PickPlaceTask {
                object: below,
                target: Vec3::new(0.4, 0.83, 0.0),
            },
            PickPlaceTask {
                object: reachable,
                target: Vec3::new(0.4, 0.83, 0.0),
            },
        ]
        .into();
        rig.executor.set_plan(plan);

        // Stuck timeout is 1.5 s of sim time; give it twice that plus the
        // travel, then expect the second task to have completed too.
        rig.run(4000);
        assert!(rig.executor.is_idle(), "stuck task was not abandoned");
        assert!(!rig.gripper.is_grasping());
        assert_eq!(rig.executor.pending_tasks(), 0);
    }

    #[test]
    fn stop_clears_queue_and_releases() {
        let mut rig = Rig::new();
        let id = rig.add_object(Vec3::new(0.1, 0.81, 0.0));
        rig.executor.set_plan(
            vec![
                PickPlaceTask {
                    object: id,
                    target: Vec3::new(-0.4, 0.83, 0.0),
                },
                PickPlaceTask {
                    object: id,
                    target: Vec3::new(0.4, 0.83, 0.0),
                },
            ]
            .into(),
        );

        // Run until the object is actually held.
        let mut ticks = 0;
        while !rig.gripper.is_grasping() && ticks < 1000 {
            rig.executor
                .tick(&mut rig.gripper, &rig.registry, &mut rig.physics, DT);
            rig.gripper.carry_sync(&mut rig.physics);
            rig.physics.step();
            ticks += 1;
        }
        assert!(rig.gripper.is_grasping());

        rig.executor.stop();
        rig.executor
            .tick(&mut rig.gripper, &rig.registry, &mut rig.physics, DT);
        assert!(rig.executor.is_idle());
        assert!(!rig.gripper.is_grasping());
        assert_eq!(rig.executor.pending_tasks(), 0);
    }
}
