//! # roarm-runtime
//!
//! The control core of RoArm Pilot.
//!
//! | Module | Role |
//! |---|---|
//! | [`convergence`] | Move-and-verify controller with a stall cap. |
//! | [`stall_guard`] | Unchanged-reading detector used by the controller. |
//! | [`choreography`] | Cancellable foreground + lanes orchestrator. |
//! | [`routines`] | Handshake, dance and light show. |
//! | [`speaker`] / [`phrases`] | Single-slot asynchronous speech and its text catalog. |
//! | [`robot`] / [`descriptor`] | Dual-mode intents and the menu built from them. |
//! | [`console`] | Free-form command console. |
//! | [`cancel`] | Cancel tokens and interrupt sources. |
//! | [`telemetry`] | `tracing` subscriber and OTLP export setup. |
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roarm_hal::{ArmLink, SimArm};
//! use roarm_runtime::{menu, Robot, RobotSettings};
//!
//! let robot = Arc::new(Robot::new(ArmLink::new(Arc::new(SimArm::new())), RobotSettings::default()));
//! for entry in menu(&robot) {
//!     println!("{} {}", entry.label(), entry.is_available());
//! }
//! ```

pub mod cancel;
pub mod choreography;
pub mod console;
pub mod convergence;
pub mod descriptor;
pub mod media;
pub mod phrases;
pub mod robot;
pub mod routines;
pub mod speaker;
pub mod stall_guard;
pub mod telemetry;

pub use cancel::{CancelToken, InterruptSource, NoInterrupt, WatchGuard};
pub use choreography::{Choreography, ChoreographyReport, Lane, LaneContext, LaneReport, Step};
pub use console::{run_command_console, CommandConsole, ConsoleSummary, EXIT_TAG};
pub use convergence::{Convergence, ConvergenceController, MotionPolicy, STALL_CAP};
pub use descriptor::{menu, Descriptor};
pub use phrases::Phrase;
pub use robot::{Mode, Robot, RobotSettings};
pub use routines::RoutineTiming;
pub use speaker::{Speaker, VoiceChange};
