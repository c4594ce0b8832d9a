//! Manipulation control: the kinematic gripper, the natural-language command
//! parser, the intent-to-plan compiler, and the per-task executor state
//! machine.

pub mod command;
pub mod compiler;
pub mod executor;
pub mod gripper;

pub use command::{Intent, parse, split_clauses};
pub use compiler::{PickPlaceTask, TaskPlan, compile};
pub use executor::{TaskExecutor, TaskPhase};
pub use gripper::Gripper;
