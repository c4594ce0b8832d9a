//! Trait seams shared across the workspace.

use crate::types::{Action, Observation};

/// Decision-making seam: maps observations to actions.
///
/// The engine defines only the interface and the observation/action formats;
/// learned policies live outside this workspace.
pub trait Policy: Send {
    /// Choose an action for the current observation.
    fn act(&mut self, observation: &Observation) -> Action;

    /// Human-readable policy name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::DeskBounds;
    use crate::types::{GraspCommand, GripperPose};

    struct Still;

    impl Policy for Still {
        fn act(&mut self, _observation: &Observation) -> Action {
            Action::default()
        }

        fn name(&self) -> &str {
            "still"
        }
    }

    #[test]
    fn policy_objects_are_boxable() {
        let mut policy: Box<dyn Policy> = Box::new(Still);
        let obs = Observation {
            objects: Vec::new(),
            gripper: GripperPose::default(),
            desk_bounds: DeskBounds::default(),
        };
        let action = policy.act(&obs);
        assert_eq!(action.grasp, GraspCommand::None);
        assert_eq!(policy.name(), "still");
    }
}
