//! Move-and-verify convergence controller.
//!
//! The arm's moves are fire-and-forget on the wire; the only way to know a
//! move finished is to poll feedback until the reading stops changing.  The
//! [`ConvergenceController`] issues one motion command and then polls with a
//! [`StallGuard`] until the reading settles inside the [`Margin`] or stays
//! unchanged outside it for [`STALL_CAP`] polls.
//!
//! A failed convergence is not an error: it is reported through
//! [`Convergence::reached`] and logged as a warning.  Only transport failures
//! surface as `Err`.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use roarm_hal::ArmLink;
use roarm_types::{
    gripper_firmware_angle, ArmCommand, JointId, Margin, Pose, RoarmError, Telemetry,
    GRIPPER_CLOSED, GRIPPER_OPEN,
};
use tracing::{debug, warn};

use crate::stall_guard::{StallGuard, Verdict};

/// Consecutive unchanged out-of-margin polls that end an attempt.
pub const STALL_CAP: usize = 3;

/// Default pacing between feedback polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a move is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPolicy {
    /// Poll telemetry until the reading settles.
    Poll,
    /// Sleep for the given time and assume the move completed.
    Settle(Duration),
}

/// Result of one convergence call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence<T> {
    pub reached: bool,
    /// Last successful reading, if any.
    pub measured: Option<T>,
    /// Feedback requests made, including the initial one.
    pub polls: usize,
    /// Whether a motion command was sent.
    pub commanded: bool,
}

impl<T> Convergence<T> {
    fn settled_blind() -> Self {
        Self {
            reached: true,
            measured: None,
            polls: 0,
            commanded: true,
        }
    }
}

/// Joint speed/acceleration used by [`ConvergenceController::move_joint`].
fn joint_profile(joint: JointId) -> (u32, u32) {
    match joint {
        JointId::Gripper => (50, 10),
        _ => (10, 10),
    }
}

pub struct ConvergenceController {
    link: ArmLink,
    margin: Margin,
    poll_interval: Duration,
    stall_cap: usize,
}

impl ConvergenceController {
    pub fn new(link: ArmLink, margin: Margin) -> Self {
        Self {
            link,
            margin,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stall_cap: STALL_CAP,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn link(&self) -> &ArmLink {
        &self.link
    }

    pub fn margin(&self) -> Margin {
        self.margin
    }

    // ────────────────────────────────────────────────────────────────────
    // Readings
    // ────────────────────────────────────────────────────────────────────

    /// Current pose, or `None` when the reply could not be decoded.
    ///
    /// # Errors
    ///
    /// Returns connection-level transport errors only.
    pub fn read_pose(&self) -> Result<Option<Pose>, RoarmError> {
        self.read(|t| t.pose())
    }

    /// Current angle of `joint` in firmware degrees.
    pub fn read_joint(&self, joint: JointId) -> Result<Option<i32>, RoarmError> {
        self.read(|t| t.joint_deg(joint))
    }

    fn read<T>(
        &self,
        extract: impl Fn(&Telemetry) -> Result<T, RoarmError>,
    ) -> Result<Option<T>, RoarmError> {
        match self.link.feedback().and_then(|t| extract(&t)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_connection_level() => Err(e),
            Err(e) => {
                debug!(target: "roarm::convergence", error = %e, "unreadable feedback");
                Ok(None)
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Moves
    // ────────────────────────────────────────────────────────────────────

    /// Move the end effector to `target`.
    ///
    /// With a `speed` the move is sent as `T:104`, otherwise as the queued
    /// `T:1041`.
    ///
    /// # Errors
    ///
    /// Returns [`RoarmError`] when the transport fails.
    pub fn move_to_pose(
        &self,
        target: Pose,
        speed: Option<u32>,
        policy: MotionPolicy,
    ) -> Result<Convergence<Pose>, RoarmError> {
        let command = match speed {
            Some(speed) => ArmCommand::PoseAtSpeed { pose: target, speed },
            None => ArmCommand::PoseQueued { pose: target },
        };
        let margin = self.margin;
        match policy {
            MotionPolicy::Settle(wait) => {
                self.link.dispatch(&command)?;
                thread::sleep(wait);
                Ok(Convergence::settled_blind())
            }
            MotionPolicy::Poll => self.converge(
                "pose",
                target,
                &command,
                || self.read_pose(),
                |p| p.within(&target, &margin),
            ),
        }
    }

    /// Drive one joint to `angle` (firmware degrees) and verify it.
    pub fn move_joint(&self, joint: JointId, angle: i32) -> Result<Convergence<i32>, RoarmError> {
        let (speed, acc) = joint_profile(joint);
        let command = ArmCommand::JointAngle {
            joint,
            angle,
            speed,
            acc,
        };
        let margin = self.margin;
        self.converge(
            joint.telemetry_field(),
            angle,
            &command,
            || self.read_joint(joint),
            |a| margin.angle_within(*a, angle),
        )
    }

    pub fn open_gripper(&self) -> Result<Convergence<i32>, RoarmError> {
        self.move_joint(JointId::Gripper, gripper_firmware_angle(GRIPPER_OPEN))
    }

    pub fn close_gripper(&self) -> Result<Convergence<i32>, RoarmError> {
        self.move_joint(JointId::Gripper, gripper_firmware_angle(GRIPPER_CLOSED))
    }

    fn converge<T: PartialEq + Copy + Display>(
        &self,
        what: &str,
        target: T,
        command: &ArmCommand,
        read: impl Fn() -> Result<Option<T>, RoarmError>,
        at_target: impl Fn(&T) -> bool,
    ) -> Result<Convergence<T>, RoarmError> {
        let initial = read()?;
        if let Some(current) = initial
            && at_target(&current)
        {
            debug!(target: "roarm::convergence", what, %target, %current, "already at target");
            return Ok(Convergence {
                reached: true,
                measured: Some(current),
                polls: 1,
                commanded: false,
            });
        }

        self.link.dispatch(command)?;

        let mut guard = StallGuard::new(self.stall_cap);
        if let Some(current) = initial {
            guard.seed(current);
        }
        let mut polls = 1;
        let mut last = initial;
        loop {
            thread::sleep(self.poll_interval);
            let reading = read()?;
            polls += 1;
            if reading.is_some() {
                last = reading;
            }
            match guard.observe(reading, reading.as_ref().is_some_and(&at_target)) {
                Verdict::Settled => {
                    debug!(target: "roarm::convergence", what, %target, polls, "setpoint reached");
                    return Ok(Convergence {
                        reached: true,
                        measured: last,
                        polls,
                        commanded: true,
                    });
                }
                Verdict::GaveUp => {
                    let measured = last.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
                    warn!(target: "roarm::convergence", what, %target, %measured, polls, "cannot reach setpoint");
                    return Ok(Convergence {
                        reached: false,
                        measured: last,
                        polls,
                        commanded: true,
                    });
                }
                Verdict::Moving | Verdict::Stalled(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roarm_hal::SimArm;
    use std::sync::Arc;

    fn controller(sim: &SimArm) -> ConvergenceController {
        ConvergenceController::new(ArmLink::new(Arc::new(sim.clone())), Margin::default())
            .with_poll_interval(Duration::ZERO)
    }

    #[test]
    fn already_within_margin_sends_nothing() {
        let target = Pose::new(80, 0, 455, 145);
        let sim = SimArm::new().at_pose(Pose::new(85, -4, 460, 145));
        let result = controller(&sim)
            .move_to_pose(target, None, MotionPolicy::Poll)
            .unwrap();
        assert!(result.reached);
        assert!(!result.commanded);
        assert_eq!(sim.motion_count(), 0);
        assert_eq!(sim.count(105), 1);
    }

    #[test]
    fn reachable_pose_converges_after_stable_reading() {
        let target = Pose::new(80, 0, 455, 145);
        let sim = SimArm::new();
        let result = controller(&sim)
            .move_to_pose(target, None, MotionPolicy::Poll)
            .unwrap();
        assert!(result.reached);
        assert_eq!(result.measured, Some(target));
        // initial, changed, unchanged-at-target
        assert_eq!(result.polls, 3);
        assert_eq!(sim.count(1041), 1);
    }

    #[test]
    fn speed_hint_selects_t104() {
        let sim = SimArm::new();
        controller(&sim)
            .move_to_pose(Pose::new(175, 235, 325, 145), Some(100), MotionPolicy::Settle(Duration::ZERO))
            .unwrap();
        let sent = sim.last(104).unwrap();
        assert_eq!(sent["spd"], 100);
        assert_eq!(sim.count(1041), 0);
        assert_eq!(sim.count(105), 0);
    }

    #[test]
    fn stuck_gripper_gives_up_at_stall_cap() {
        let sim = SimArm::new().with_stuck_joint(JointId::Gripper, 170);
        let result = controller(&sim).open_gripper().unwrap();
        assert!(!result.reached);
        assert_eq!(result.measured, Some(170));
        assert_eq!(result.polls, 1 + STALL_CAP);

        let sent = sim.last(121).unwrap();
        assert_eq!(sent["joint"], 4);
        assert_eq!(sent["angle"], 135);
        assert_eq!(sent["spd"], 50);
        assert_eq!(sent["acc"], 10);
    }

    #[test]
    fn changing_readings_reset_the_stall_count() {
        let sim = SimArm::new().with_stuck_joint(JointId::Gripper, 150);
        // initial 150, then two stalls, then movement, then three stalls
        sim.script_gripper([150, 150, 150, 160, 160, 160, 160]);
        let result = controller(&sim).open_gripper().unwrap();
        assert!(!result.reached);
        assert_eq!(result.polls, 7);
    }

    #[test]
    fn close_gripper_targets_firmware_180() {
        let sim = SimArm::new().at_pose(Pose::new(175, 235, 325, 145));
        let result = controller(&sim).close_gripper().unwrap();
        assert!(result.reached);
        assert!(result.commanded);
        assert_eq!(sim.joint(JointId::Gripper), 180);
    }

    #[test]
    fn unreachable_transport_is_an_error() {
        let sim = SimArm::new();
        sim.set_offline(true);
        let err = controller(&sim)
            .move_to_pose(Pose::new(80, 0, 455, 145), None, MotionPolicy::Poll)
            .unwrap_err();
        assert!(err.is_connection_level());
    }
}
