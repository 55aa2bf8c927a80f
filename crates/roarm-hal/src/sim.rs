//! In-process simulated arm for tests and headless runs.
//!
//! [`SimArm`] implements [`MotionTransport`] and answers the same JSON
//! command set as the firmware.  Moves complete instantly, so the
//! convergence controller sees the target on its next poll, unless the test
//! has asked for a joint to be stuck or has scripted feedback readings.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use roarm_hal::{ArmLink, SimArm};
//! use roarm_types::{ArmCommand, Pose};
//!
//! let sim = SimArm::new();
//! let link = ArmLink::new(Arc::new(sim.clone()));
//!
//! let pose = Pose::new(80, 0, 455, 145);
//! link.dispatch(&ArmCommand::PoseQueued { pose }).expect("sim move must succeed");
//! assert_eq!(sim.pose(), pose);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use roarm_types::{deg_to_rad, JointId, Pose, RoarmError};
use serde_json::{json, Value};

use crate::transport::{validate_payload, MotionTransport};

/// Pose the simulated arm reports after `T:100`.
pub const SIM_INIT_POSE: Pose = Pose::new(310, 0, 234, 180);

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

struct SimState {
    pose: Pose,
    joints: HashMap<JointId, i32>,
    led: u8,
    torque_locked: bool,
    offline: bool,
    received: Vec<Value>,
    scripted_poses: VecDeque<Pose>,
    scripted_gripper: VecDeque<i32>,
    stuck: HashMap<JointId, i32>,
}

impl SimState {
    fn gripper(&self) -> i32 {
        self.joints.get(&JointId::Gripper).copied().unwrap_or(SIM_INIT_POSE.wrist)
    }

    fn set_joint(&mut self, joint: JointId, angle: i32) {
        let angle = self.stuck.get(&joint).copied().unwrap_or(angle);
        self.joints.insert(joint, angle);
        if joint == JointId::Gripper {
            self.pose.wrist = angle;
        }
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = Pose { wrist: self.pose.wrist, ..pose };
        self.set_joint(JointId::Gripper, pose.wrist);
    }

    fn feedback(&mut self) -> Value {
        let pose = self.scripted_poses.pop_front().unwrap_or(self.pose);
        let gripper = self
            .scripted_gripper
            .pop_front()
            .unwrap_or_else(|| if pose == self.pose { self.gripper() } else { pose.wrist });
        let joint = |j: JointId| deg_to_rad(self.joints.get(&j).copied().unwrap_or(0));
        json!({
            "T": 1051,
            "x": pose.x,
            "y": pose.y,
            "z": pose.z,
            "t": deg_to_rad(gripper),
            "b": joint(JointId::Base),
            "s": joint(JointId::Shoulder),
            "e": joint(JointId::Elbow),
            "torB": 0,
        })
    }

    fn handle(&mut self, command: &Value) -> String {
        let code = command.get("T").and_then(Value::as_u64).unwrap_or(0);
        let int = |field: &str| command.get(field).and_then(Value::as_f64).unwrap_or(0.0);
        match code {
            100 => {
                self.set_joint(JointId::Base, 0);
                self.set_joint(JointId::Shoulder, 0);
                self.set_joint(JointId::Elbow, 90);
                self.set_pose(SIM_INIT_POSE);
                String::new()
            }
            105 => self.feedback().to_string(),
            121 => {
                let joint = match int("joint") as u8 {
                    1 => Some(JointId::Base),
                    2 => Some(JointId::Shoulder),
                    3 => Some(JointId::Elbow),
                    4 => Some(JointId::Gripper),
                    _ => None,
                };
                if let Some(joint) = joint {
                    self.set_joint(joint, int("angle").round() as i32);
                }
                String::new()
            }
            104 | 1041 => {
                let wrist = int("t").to_degrees().round() as i32;
                self.set_pose(Pose::new(
                    int("x").round() as i32,
                    int("y").round() as i32,
                    int("z").round() as i32,
                    wrist,
                ));
                String::new()
            }
            114 => {
                self.led = int("led").clamp(0.0, 255.0) as u8;
                String::new()
            }
            210 => {
                self.torque_locked = int("cmd") != 0.0;
                String::new()
            }
            302 => json!({ "model": "RoArm-M2-S (sim)", "mac": "00:00:00:00:00:00" }).to_string(),
            405 => json!({ "ip": "127.0.0.1", "mode": "sim", "rssi": 0 }).to_string(),
            _ => String::new(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimArm
// ────────────────────────────────────────────────────────────────────────────

/// A simulated arm.  Clones share state, so a test can keep one handle for
/// inspection while the code under test owns another.
#[derive(Clone)]
pub struct SimArm {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimArm {
    fn default() -> Self {
        Self::new()
    }
}

impl SimArm {
    /// A simulated arm resting at [`SIM_INIT_POSE`].
    pub fn new() -> Self {
        let mut joints = HashMap::new();
        joints.insert(JointId::Base, 0);
        joints.insert(JointId::Shoulder, 0);
        joints.insert(JointId::Elbow, 90);
        joints.insert(JointId::Gripper, SIM_INIT_POSE.wrist);
        Self {
            state: Arc::new(Mutex::new(SimState {
                pose: SIM_INIT_POSE,
                joints,
                led: 0,
                torque_locked: true,
                offline: false,
                received: Vec::new(),
                scripted_poses: VecDeque::new(),
                scripted_gripper: VecDeque::new(),
                stuck: HashMap::new(),
            })),
        }
    }

    /// Start at `pose` instead of the init pose.
    pub fn at_pose(self, pose: Pose) -> Self {
        self.lock().set_pose(pose);
        self
    }

    /// Pin `joint` at `angle`: commands to it are accepted but it never
    /// moves, like a servo blocked by an object.
    pub fn with_stuck_joint(self, joint: JointId, angle: i32) -> Self {
        {
            let mut state = self.lock();
            state.stuck.insert(joint, angle);
            state.set_joint(joint, angle);
        }
        self
    }

    /// Queue pose readings returned by the next feedback requests, one per
    /// request, before live state is reported again.
    pub fn script_poses(&self, poses: impl IntoIterator<Item = Pose>) {
        self.lock().scripted_poses.extend(poses);
    }

    /// Queue gripper readings (firmware degrees) for the next feedback
    /// requests.
    pub fn script_gripper(&self, angles: impl IntoIterator<Item = i32>) {
        self.lock().scripted_gripper.extend(angles);
    }

    /// Make every exchange fail as if the host were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Nudge the live pose, e.g. a hand pulling on the gripper.
    pub fn nudge(&self, pose: Pose) {
        self.lock().pose = pose;
    }

    pub fn pose(&self) -> Pose {
        self.lock().pose
    }

    pub fn joint(&self, joint: JointId) -> i32 {
        self.lock().joints.get(&joint).copied().unwrap_or(0)
    }

    pub fn led(&self) -> u8 {
        self.lock().led
    }

    pub fn torque_locked(&self) -> bool {
        self.lock().torque_locked
    }

    /// Every command received so far, in order.
    pub fn received(&self) -> Vec<Value> {
        self.lock().received.clone()
    }

    /// Number of received commands with firmware code `code`.
    pub fn count(&self, code: u64) -> usize {
        self.lock()
            .received
            .iter()
            .filter(|c| c.get("T").and_then(Value::as_u64) == Some(code))
            .count()
    }

    /// Number of received commands that make the arm move.
    pub fn motion_count(&self) -> usize {
        [100, 104, 121, 1041].iter().map(|code| self.count(*code)).sum()
    }

    /// The most recent command with firmware code `code`.
    pub fn last(&self, code: u64) -> Option<Value> {
        self.lock()
            .received
            .iter()
            .rev()
            .find(|c| c.get("T").and_then(Value::as_u64) == Some(code))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A panicking test thread must not take every later assertion down
        // with it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MotionTransport for SimArm {
    fn exchange(&self, payload: &str) -> Result<String, RoarmError> {
        let command = validate_payload(payload)?;
        let mut state = self.lock();
        if state.offline {
            return Err(RoarmError::Unreachable {
                address: "sim".to_string(),
                details: "simulated link down".to_string(),
            });
        }
        state.received.push(command.clone());
        Ok(state.handle(&command))
    }

    fn describe(&self) -> String {
        "sim@localhost".to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
