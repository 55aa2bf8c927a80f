//! Arm geometry: end-effector poses, joint identifiers and tolerance margins.

use serde::{Deserialize, Serialize};

/// Firmware zero point for the gripper joint.  The firmware angle is
/// `GRIPPER_ANGLE_BASE - logical angle`.
pub const GRIPPER_ANGLE_BASE: i32 = 180;

/// Logical gripper angle when fully open.
pub const GRIPPER_OPEN: i32 = 45;

/// Logical gripper angle when fully closed.
pub const GRIPPER_CLOSED: i32 = 0;

/// Convert a logical gripper angle (0 = closed) into the angle the firmware
/// expects on joint 4.
pub const fn gripper_firmware_angle(logical: i32) -> i32 {
    GRIPPER_ANGLE_BASE - logical
}

/// Radians reported by telemetry, rounded to whole degrees.
pub fn rad_to_deg(rad: f64) -> i32 {
    rad.to_degrees().round() as i32
}

/// Whole degrees to the radians the pose commands carry.
pub fn deg_to_rad(deg: i32) -> f64 {
    f64::from(deg).to_radians()
}

/// End-effector placement: position in millimetres plus wrist angle in
/// degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pose {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub wrist: i32,
}

impl Pose {
    pub const fn new(x: i32, y: i32, z: i32, wrist: i32) -> Self {
        Self { x, y, z, wrist }
    }

    /// `true` when every axis is independently within `margin` of `target`.
    pub fn within(&self, target: &Pose, margin: &Margin) -> bool {
        (self.x - target.x).abs() <= margin.pose_mm
            && (self.y - target.y).abs() <= margin.pose_mm
            && (self.z - target.z).abs() <= margin.pose_mm
            && margin.angle_within(self.wrist, target.wrist)
    }

    pub fn wrist_rad(&self) -> f64 {
        deg_to_rad(self.wrist)
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(x={}, y={}, z={}, wrist={}°)",
            self.x, self.y, self.z, self.wrist
        )
    }
}

/// Per-quantity tolerance below which a measured value counts as "at
/// target".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margin {
    pub pose_mm: i32,
    pub angle_deg: i32,
}

impl Margin {
    pub fn angle_within(&self, measured: i32, target: i32) -> bool {
        (measured - target).abs() <= self.angle_deg
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            pose_mm: 10,
            angle_deg: 1,
        }
    }
}

/// Addressable joints of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointId {
    Base,
    Shoulder,
    Elbow,
    Gripper,
}

impl JointId {
    /// Joint number used in `T:121` commands.
    pub fn number(self) -> u8 {
        match self {
            JointId::Base => 1,
            JointId::Shoulder => 2,
            JointId::Elbow => 3,
            JointId::Gripper => 4,
        }
    }

    /// Feedback field carrying this joint's angle in radians.
    pub fn telemetry_field(self) -> &'static str {
        match self {
            JointId::Base => "b",
            JointId::Shoulder => "s",
            JointId::Elbow => "e",
            JointId::Gripper => "t",
        }
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JointId::Base => "base",
            JointId::Shoulder => "shoulder",
            JointId::Elbow => "elbow",
            JointId::Gripper => "gripper",
        };
        f.write_str(name)
    }
}
