//! [`ArmLink`] – command dispatcher in front of a [`MotionTransport`].
//!
//! Every [`ArmCommand`] the workspace issues goes through
//! [`ArmLink::dispatch`], which serializes it, hands it to the transport and
//! decodes the body into a [`Reply`].  Free-form operator input takes the
//! [`ArmLink::send_raw`] path, which forwards the text verbatim.

use std::sync::Arc;

use roarm_types::{ArmCommand, Reply, RoarmError, Telemetry};
use tracing::{debug, warn};

use crate::transport::MotionTransport;

/// Shared handle to the arm.  Cheap to clone.
#[derive(Clone)]
pub struct ArmLink {
    transport: Arc<dyn MotionTransport>,
}

impl ArmLink {
    pub fn new(transport: Arc<dyn MotionTransport>) -> Self {
        Self { transport }
    }

    /// Send `command` and decode the reply.
    ///
    /// # Errors
    ///
    /// Propagates the transport's error unchanged; connection-level failures
    /// are logged here once so callers do not have to.
    pub fn dispatch(&self, command: &ArmCommand) -> Result<Reply, RoarmError> {
        let payload = command.payload();
        debug!(target: "roarm::link", code = command.code(), %payload, "dispatch");
        match self.transport.exchange(&payload) {
            Ok(body) => Ok(Reply::parse(&body)),
            Err(e) => {
                if e.is_connection_level() {
                    warn!(target: "roarm::link", error = %e, code = command.code(), "transport unreachable");
                }
                Err(e)
            }
        }
    }

    /// Forward an operator-typed payload verbatim.
    pub fn send_raw(&self, payload: &str) -> Result<Reply, RoarmError> {
        debug!(target: "roarm::link", %payload, "raw dispatch");
        self.transport.exchange(payload).map(|body| Reply::parse(&body))
    }

    /// Request a `T:105` feedback snapshot.
    pub fn feedback(&self) -> Result<Telemetry, RoarmError> {
        self.dispatch(&ArmCommand::Feedback)?.into_telemetry()
    }

    pub fn describe(&self) -> String {
        self.transport.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimArm;
    use roarm_types::{JointId, Pose};

    #[test]
    fn dispatch_moves_sim_arm() {
        let sim = SimArm::new();
        let link = ArmLink::new(Arc::new(sim.clone()));
        let pose = Pose::new(80, 0, 455, 145);

        link.dispatch(&ArmCommand::PoseQueued { pose }).unwrap();

        assert_eq!(sim.pose(), pose);
        assert_eq!(link.feedback().unwrap().pose().unwrap(), pose);
    }

    #[test]
    fn dispatch_joint_angle_updates_joint() {
        let sim = SimArm::new();
        let link = ArmLink::new(Arc::new(sim.clone()));
        link.dispatch(&ArmCommand::JointAngle {
            joint: JointId::Base,
            angle: 45,
            speed: 10,
            acc: 10,
        })
        .unwrap();
        assert_eq!(sim.joint(JointId::Base), 45);
        assert_eq!(link.feedback().unwrap().joint_deg(JointId::Base).unwrap(), 45);
    }

    #[test]
    fn offline_transport_surfaces_unreachable() {
        let sim = SimArm::new();
        sim.set_offline(true);
        let link = ArmLink::new(Arc::new(sim));
        let err = link.dispatch(&ArmCommand::Feedback).unwrap_err();
        assert!(err.is_connection_level());
    }

    #[test]
    fn send_raw_forwards_verbatim() {
        let sim = SimArm::new();
        let link = ArmLink::new(Arc::new(sim.clone()));
        link.send_raw(r#"{"T":114,"led":7}"#).unwrap();
        assert_eq!(sim.led(), 7);
        assert!(matches!(
            link.send_raw("not json"),
            Err(RoarmError::InvalidCommand(_))
        ));
    }
}
