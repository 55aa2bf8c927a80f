//! The fixed JSON command set spoken by the arm's firmware.
//!
//! Each variant maps to one `T` code.  [`ArmCommand::to_json`] produces the
//! exact object sent over the wire; nothing else in the workspace builds
//! command JSON by hand.

use serde_json::{json, Value};

use crate::geometry::{JointId, Pose};

#[derive(Debug, Clone, PartialEq)]
pub enum ArmCommand {
    /// Return every joint to the firmware's initial (base) position.
    MoveInit,
    /// Request a full servo/pose feedback snapshot.
    Feedback,
    /// Drive a single joint to `angle` degrees.
    JointAngle {
        joint: JointId,
        angle: i32,
        speed: u32,
        acc: u32,
    },
    /// Inverse-kinematics move without a speed hint (queued by the firmware).
    PoseQueued { pose: Pose },
    /// Inverse-kinematics move at an explicit speed.
    PoseAtSpeed { pose: Pose, speed: u32 },
    /// Set the LED brightness; 0 switches it off.
    Led { level: u8 },
    /// Lock (`true`) or release (`false`) servo torque.
    Torque { locked: bool },
    DeviceInfo,
    WifiInfo,
}

impl ArmCommand {
    /// Firmware command code.
    pub fn code(&self) -> u32 {
        match self {
            ArmCommand::MoveInit => 100,
            ArmCommand::Feedback => 105,
            ArmCommand::JointAngle { .. } => 121,
            ArmCommand::PoseQueued { .. } => 1041,
            ArmCommand::PoseAtSpeed { .. } => 104,
            ArmCommand::Led { .. } => 114,
            ArmCommand::Torque { .. } => 210,
            ArmCommand::DeviceInfo => 302,
            ArmCommand::WifiInfo => 405,
        }
    }

    pub fn to_json(&self) -> Value {
        let code = self.code();
        match self {
            ArmCommand::MoveInit
            | ArmCommand::Feedback
            | ArmCommand::DeviceInfo
            | ArmCommand::WifiInfo => json!({ "T": code }),
            ArmCommand::JointAngle {
                joint,
                angle,
                speed,
                acc,
            } => json!({
                "T": code,
                "joint": joint.number(),
                "angle": angle,
                "spd": speed,
                "acc": acc,
            }),
            ArmCommand::PoseQueued { pose } => json!({
                "T": code,
                "x": pose.x,
                "y": pose.y,
                "z": pose.z,
                "t": pose.wrist_rad(),
            }),
            ArmCommand::PoseAtSpeed { pose, speed } => json!({
                "T": code,
                "x": pose.x,
                "y": pose.y,
                "z": pose.z,
                "t": pose.wrist_rad(),
                "spd": speed,
            }),
            ArmCommand::Led { level } => json!({ "T": code, "led": level }),
            ArmCommand::Torque { locked } => json!({ "T": code, "cmd": u8::from(*locked) }),
        }
    }

    /// Serialized wire payload.
    pub fn payload(&self) -> String {
        self.to_json().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gripper_open_command_matches_firmware_shape() {
        let cmd = ArmCommand::JointAngle {
            joint: JointId::Gripper,
            angle: 135,
            speed: 50,
            acc: 10,
        };
        let v = cmd.to_json();
        assert_eq!(v["T"], 121);
        assert_eq!(v["joint"], 4);
        assert_eq!(v["angle"], 135);
        assert_eq!(v["spd"], 50);
        assert_eq!(v["acc"], 10);
    }

    #[test]
    fn speed_hint_selects_absolute_pose_code() {
        let pose = Pose::new(175, 235, 325, 145);
        assert_eq!(ArmCommand::PoseQueued { pose }.code(), 1041);
        let v = ArmCommand::PoseAtSpeed { pose, speed: 100 }.to_json();
        assert_eq!(v["T"], 104);
        assert_eq!(v["spd"], 100);
        let t = v["t"].as_f64().unwrap();
        assert!((t - 145f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn torque_and_led_payloads() {
        assert_eq!(
            ArmCommand::Torque { locked: false }.payload(),
            r#"{"T":210,"cmd":0}"#
        );
        assert_eq!(ArmCommand::Led { level: 0 }.payload(), r#"{"T":114,"led":0}"#);
        assert_eq!(ArmCommand::MoveInit.payload(), r#"{"T":100}"#);
    }
}
