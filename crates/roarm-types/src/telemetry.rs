//! Decoded transport replies.

use serde_json::{Map, Value};

use crate::RoarmError;
use crate::geometry::{JointId, Pose, rad_to_deg};

/// A reply from the arm: either a JSON object of named fields or whatever
/// text came back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Telemetry(Telemetry),
    Raw(String),
}

impl Reply {
    /// Decode a response body.  Anything that is not a JSON object is kept as
    /// raw text.
    pub fn parse(body: &str) -> Reply {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Reply::Telemetry(Telemetry(map)),
            _ => Reply::Raw(body.to_string()),
        }
    }

    pub fn into_telemetry(self) -> Result<Telemetry, RoarmError> {
        match self {
            Reply::Telemetry(t) => Ok(t),
            Reply::Raw(body) => Err(RoarmError::MalformedReply(format!(
                "expected a JSON object, got {:?}",
                body
            ))),
        }
    }

    /// Human-readable rendering used when logging informational reads.
    pub fn render(&self) -> String {
        match self {
            Reply::Telemetry(t) => t.lines(),
            Reply::Raw(body) => body.clone(),
        }
    }
}

/// Named numeric/string fields reported by the arm.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Telemetry(pub Map<String, Value>);

impl Telemetry {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn number(&self, field: &str) -> Result<f64, RoarmError> {
        self.0
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| RoarmError::MalformedReply(format!("missing numeric field `{field}`")))
    }

    /// End-effector pose from a `T:105` feedback reply.
    pub fn pose(&self) -> Result<Pose, RoarmError> {
        Ok(Pose {
            x: self.number("x")?.round() as i32,
            y: self.number("y")?.round() as i32,
            z: self.number("z")?.round() as i32,
            wrist: rad_to_deg(self.number("t")?),
        })
    }

    /// Joint angle in whole degrees.
    pub fn joint_deg(&self, joint: JointId) -> Result<i32, RoarmError> {
        Ok(rad_to_deg(self.number(joint.telemetry_field())?))
    }

    /// `key : value` lines, one per field.
    pub fn lines(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.0 {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            out.push_str(&format!("{key} : {rendered}\n"));
        }
        out
    }
}
