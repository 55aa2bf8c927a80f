//! Generic `MotionTransport` trait for whatever carries commands to the arm.
//!
//! Transports register nowhere; they are handed to an
//! [`ArmLink`][crate::link::ArmLink] at construction.  The rest of the
//! workspace only ever talks to the link, so the HTTP transport and the
//! simulator are interchangeable.

use roarm_types::RoarmError;

/// A synchronous request/response channel to the arm.
pub trait MotionTransport: Send + Sync {
    /// Send one JSON command payload and return the raw response body.
    ///
    /// # Errors
    ///
    /// - [`RoarmError::InvalidCommand`] when `payload` is not JSON; nothing
    ///   is sent in that case.
    /// - [`RoarmError::Unreachable`] on a connection-level failure.
    /// - [`RoarmError::Rejected`] when the arm answers with a failure status.
    fn exchange(&self, payload: &str) -> Result<String, RoarmError>;

    /// Short description of the connection, e.g. `"http@192.168.4.1"`.
    fn describe(&self) -> String;
}

/// Reject payloads that are not JSON before they reach the wire.
pub(crate) fn validate_payload(payload: &str) -> Result<serde_json::Value, RoarmError> {
    serde_json::from_str(payload).map_err(|e| RoarmError::InvalidCommand(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Minimal in-process transport used only for tests.
    struct EchoTransport {
        sent: Mutex<Vec<String>>,
    }

    impl MotionTransport for EchoTransport {
        fn exchange(&self, payload: &str) -> Result<String, RoarmError> {
            validate_payload(payload)?;
            self.sent.lock().unwrap().push(payload.to_string());
            Ok(payload.to_string())
        }

        fn describe(&self) -> String {
            "echo".to_string()
        }
    }

    #[test]
    fn echo_transport_round_trips_payload() {
        let t = EchoTransport {
            sent: Mutex::new(Vec::new()),
        };
        assert_eq!(t.exchange(r#"{"T":105}"#).unwrap(), r#"{"T":105}"#);
        assert_eq!(t.describe(), "echo");
        assert_eq!(t.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn invalid_payload_is_rejected_before_sending() {
        let t = EchoTransport {
            sent: Mutex::new(Vec::new()),
        };
        let err = t.exchange("{T:105").unwrap_err();
        assert!(matches!(err, RoarmError::InvalidCommand(_)));
        assert!(t.sent.lock().unwrap().is_empty());
    }
}
