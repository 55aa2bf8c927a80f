//! `roarm-types` – shared vocabulary for the RoArm pilot workspace.
//!
//! Everything that crosses a crate boundary lives here: the arm's geometric
//! state ([`Pose`], [`JointId`], [`Margin`]), the fixed JSON command set the
//! firmware understands ([`ArmCommand`]), decoded replies ([`Reply`],
//! [`Telemetry`]), the voice tuple ([`Voice`]) and the workspace-wide error
//! type ([`RoarmError`]).

pub mod command;
pub mod geometry;
pub mod telemetry;
pub mod voice;

pub use command::ArmCommand;
pub use geometry::{
    deg_to_rad, gripper_firmware_angle, rad_to_deg, JointId, Margin, Pose, GRIPPER_ANGLE_BASE,
    GRIPPER_CLOSED, GRIPPER_OPEN,
};
pub use telemetry::{Reply, Telemetry};
pub use voice::{Gender, Language, Voice};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Global error type spanning transport failures, malformed replies, voice
/// and media problems.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoarmError {
    #[error("Robot unreachable at {address}: {details}")]
    Unreachable { address: String, details: String },

    #[error("Robot rejected request with HTTP {0}")]
    Rejected(u16),

    #[error("Given json is invalid: {0}")]
    InvalidCommand(String),

    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    #[error("Voice unavailable: {0}")]
    VoiceUnavailable(String),

    #[error("Media playback failed: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RoarmError {
    /// `true` for errors that mean "the arm could not be talked to at all",
    /// as opposed to "it answered with something we could not use".
    pub fn is_connection_level(&self) -> bool {
        matches!(self, RoarmError::Unreachable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roarm_error_display() {
        let err = RoarmError::Unreachable {
            address: "192.168.4.1".to_string(),
            details: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("192.168.4.1"));
        assert!(err.is_connection_level());

        let err2 = RoarmError::MalformedReply("missing field `x`".to_string());
        assert!(err2.to_string().contains("missing field"));
        assert!(!err2.is_connection_level());
    }

    #[test]
    fn invalid_command_message_names_the_problem() {
        let err = RoarmError::InvalidCommand("expected value at line 1".into());
        assert!(err.to_string().starts_with("Given json is invalid"));
    }
}
