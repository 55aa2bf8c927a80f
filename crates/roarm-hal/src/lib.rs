//! `roarm-hal` – Hardware Abstraction Layer
//!
//! The rest of the workspace never talks HTTP or spawns a synthesizer
//! directly; it talks to the traits defined here.
//!
//! # Modules
//!
//! - [`transport`] – [`MotionTransport`][transport::MotionTransport]: the
//!   synchronous request/response seam to the arm.
//! - [`link`] – [`ArmLink`][link::ArmLink]: turns
//!   [`ArmCommand`][roarm_types::ArmCommand]s into payloads, sends them over
//!   a transport and decodes the [`Reply`][roarm_types::Reply].
//! - [`http`] – [`HttpTransport`][http::HttpTransport]: the arm's
//!   `GET /js?json=…` endpoint via blocking `reqwest`.
//! - [`sim`] – [`SimArm`][sim::SimArm]: an in-process arm for tests and
//!   headless runs.
//! - [`voice`] – [`VoiceService`][voice::VoiceService] plus a shell-driven
//!   synthesizer and a recording double.

pub mod http;
pub mod link;
pub mod sim;
pub mod transport;
pub mod voice;

pub use http::HttpTransport;
pub use link::ArmLink;
pub use sim::SimArm;
pub use transport::MotionTransport;
pub use voice::{CommandVoice, RecordingVoice, VoiceService};
