//! Shared data model: object identity and classification, geometry
//! primitives, and the observation/action/step types exchanged with policies.

use std::fmt;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::bounds::DeskBounds;
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Object identity and classification
// ---------------------------------------------------------------------------

/// Stable identifier for a scene object.
///
/// Assigned monotonically by the registry and never reused within a session,
/// so a stale id can never silently alias a newer object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj{}", self.0)
    }
}

/// What an object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Utensil,
    Book,
    Trash,
    Generic,
}

impl ObjectKind {
    /// Number of kind variants, for one-hot encoding.
    pub const COUNT: usize = 4;

    /// The task group this kind belongs to by default.
    #[must_use]
    pub const fn default_group(self) -> ObjectGroup {
        match self {
            Self::Utensil => ObjectGroup::Utensils,
            Self::Book => ObjectGroup::Books,
            Self::Trash => ObjectGroup::Trash,
            Self::Generic => ObjectGroup::Items,
        }
    }

    /// Stable index for one-hot encoding.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Utensil => 0,
            Self::Book => 1,
            Self::Trash => 2,
            Self::Generic => 3,
        }
    }
}

/// Task-level grouping used by commands and rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectGroup {
    Utensils,
    Books,
    Trash,
    Items,
}

impl ObjectGroup {
    /// Number of group variants, for one-hot encoding.
    pub const COUNT: usize = 4;

    /// Stable index for one-hot encoding.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Utensils => 0,
            Self::Books => 1,
            Self::Trash => 2,
            Self::Items => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utensils => "utensils",
            Self::Books => "books",
            Self::Trash => "trash",
            Self::Items => "items",
        }
    }

    /// Match a group mentioned in lowercased command text.
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        if text.contains("utensil") || text.contains("pen") || text.contains("marker") {
            Some(Self::Utensils)
        } else if text.contains("book") {
            Some(Self::Books)
        } else if text.contains("trash") || text.contains("garbage") {
            Some(Self::Trash)
        } else if text.contains("item") || text.contains("everything") || text.contains("object") {
            Some(Self::Items)
        } else {
            None
        }
    }
}

impl fmt::Display for ObjectGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse color attribute, used by the organize-by-color command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ColorTag {
    Red,
    Green,
    Blue,
    Yellow,
    Neutral,
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Collider primitive for a scene object, also used by the visual fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Cylinder { radius: f32, half_height: f32 },
    Cuboid { half_extents: [f32; 3] },
    Sphere { radius: f32 },
}

impl Shape {
    /// Vertical half-extent, for spawning objects resting on a surface.
    #[must_use]
    pub fn vertical_half_extent(&self) -> f32 {
        match *self {
            Self::Cylinder { half_height, .. } => half_height,
            Self::Cuboid { half_extents } => half_extents[1],
            Self::Sphere { radius } => radius,
        }
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// Point-in-time view of one object, read fresh from the physics state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub group: ObjectGroup,
    pub color: ColorTag,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    /// Summed absolute velocity components exceed the motion threshold.
    pub is_moving: bool,
}

impl ObjectState {
    #[must_use]
    pub const fn pos(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }

    #[must_use]
    pub const fn vel(&self) -> Vec3 {
        Vec3::new(self.velocity[0], self.velocity[1], self.velocity[2])
    }
}

/// Gripper pose as seen by policies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GripperPose {
    pub position: [f32; 3],
    pub grasping: bool,
}

impl GripperPose {
    #[must_use]
    pub const fn pos(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }
}

/// Full environment observation returned by reset and step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub objects: Vec<ObjectState>,
    pub gripper: GripperPose,
    pub desk_bounds: DeskBounds,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Grasp part of a policy action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraspCommand {
    /// Keep the current grasp state.
    #[default]
    None,
    /// Attempt to grasp the named object.
    Grasp(ObjectId),
    /// Release the held object, if any.
    Release,
}

/// Policy action: a relative gripper displacement plus a grasp command.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    /// Displacement in meters, clamped per axis to [`Action::MAX_DELTA`].
    pub move_delta: [f32; 3],
    pub grasp: GraspCommand,
}

impl Action {
    /// Per-axis displacement limit in meters per step.
    pub const MAX_DELTA: f32 = 0.5;

    #[must_use]
    pub const fn new(move_delta: [f32; 3], grasp: GraspCommand) -> Self {
        Self { move_delta, grasp }
    }

    /// Reject non-finite displacements before they reach the simulation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for &v in &self.move_delta {
            if v.is_nan() {
                return Err(ValidationError::ActionContainsNan);
            }
            if v.is_infinite() {
                return Err(ValidationError::ActionContainsInf);
            }
        }
        Ok(())
    }

    /// The action with each displacement axis clamped to the limit.
    #[must_use]
    pub fn clamped(self) -> Self {
        let mut d = self.move_delta;
        for v in &mut d {
            *v = v.clamp(-Self::MAX_DELTA, Self::MAX_DELTA);
        }
        Self {
            move_delta: d,
            grasp: self.grasp,
        }
    }

    #[must_use]
    pub const fn delta(&self) -> Vec3 {
        Vec3::new(self.move_delta[0], self.move_delta[1], self.move_delta[2])
    }
}

// ---------------------------------------------------------------------------
// Step results
// ---------------------------------------------------------------------------

/// Per-step diagnostic counters and terminal flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepInfo {
    /// Trash objects still on the desk surface.
    pub trash_on_desk: u32,
    pub utensils_in_zone: u32,
    pub utensils_total: u32,
    pub books_in_zone: u32,
    pub books_total: u32,
    /// All trash removed and all utensils/books in their assigned zones.
    pub success: bool,
    /// Episode ended by the step limit rather than a terminal condition.
    pub timeout: bool,
    /// Gripper dropped below the desk's minimum height.
    pub fell_off: bool,
}

/// Result of one environment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
