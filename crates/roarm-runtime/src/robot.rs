//! [`Robot`] – the operator-facing facade.
//!
//! Every intent is a method `fn(&self, Mode) -> bool`.  In [`Mode::Query`]
//! it answers "is this meaningful right now?" from cached state or a
//! short-lived telemetry snapshot and never moves the arm.  In
//! [`Mode::Execute`] it performs the intent and reports success.  Execute
//! never relies on a preceding Query.
//!
//! Errors stop at this layer: they are logged and turned into `false`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use roarm_hal::{ArmLink, VoiceService};
use roarm_types::{
    gripper_firmware_angle, ArmCommand, JointId, Language, Margin, RoarmError, Telemetry,
    GRIPPER_CLOSED, GRIPPER_OPEN,
};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::cancel::{CancelToken, InterruptSource, NoInterrupt};
use crate::choreography::ChoreographyReport;
use crate::console::{run_command_console, ClosedConsole, CommandConsole};
use crate::convergence::{ConvergenceController, MotionPolicy, DEFAULT_POLL_INTERVAL};
use crate::phrases::Phrase;
use crate::routines::{self, RoutineTiming, Stage, LED_FULL, PARKED_POSE};
use crate::speaker::{Speaker, VoiceChange};

/// Base joint target of "move left"; "move right" is the negation.
pub const BASE_SWING_DEG: i32 = 45;

/// Whether an intent is being asked about or carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Query,
    Execute,
}

/// Tunables of one robot session.
#[derive(Debug, Clone)]
pub struct RobotSettings {
    pub margin: Margin,
    pub poll_interval: Duration,
    pub timing: RoutineTiming,
    pub dance_media: Option<String>,
    /// How long a telemetry snapshot answers availability queries.
    pub status_ttl: Duration,
}

impl Default for RobotSettings {
    fn default() -> Self {
        Self {
            margin: Margin::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timing: RoutineTiming::default(),
            dance_media: None,
            status_ttl: Duration::from_millis(250),
        }
    }
}

pub struct Robot {
    controller: ConvergenceController,
    speaker: Speaker,
    settings: RobotSettings,
    interrupts: Arc<dyn InterruptSource>,
    console: Mutex<Box<dyn CommandConsole>>,
    led: Mutex<Option<u8>>,
    torque_locked: Mutex<Option<bool>>,
    status: Mutex<Option<(Instant, Telemetry)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

impl Robot {
    /// A robot without voice, interrupt source or console.
    pub fn new(link: ArmLink, settings: RobotSettings) -> Self {
        let controller = ConvergenceController::new(link, settings.margin)
            .with_poll_interval(settings.poll_interval);
        Self {
            controller,
            speaker: Speaker::silent(),
            settings,
            interrupts: Arc::new(NoInterrupt),
            console: Mutex::new(Box::new(ClosedConsole)),
            led: Mutex::new(None),
            torque_locked: Mutex::new(None),
            status: Mutex::new(None),
        }
    }

    pub fn with_voice(mut self, voice: Option<Arc<dyn VoiceService>>) -> Self {
        self.speaker = Speaker::new(voice);
        self
    }

    pub fn with_interrupts(mut self, interrupts: Arc<dyn InterruptSource>) -> Self {
        self.interrupts = interrupts;
        self
    }

    pub fn with_console(mut self, console: Box<dyn CommandConsole>) -> Self {
        self.console = Mutex::new(console);
        self
    }

    pub fn link(&self) -> &ArmLink {
        self.controller.link()
    }

    pub fn speaker(&self) -> &Speaker {
        &self.speaker
    }

    // ────────────────────────────────────────────────────────────────────
    // Session
    // ────────────────────────────────────────────────────────────────────

    /// Announce start-up and go to base.
    pub fn engage(&self) -> bool {
        info!(target: "roarm::robot", arm = %self.link().describe(), "engaging");
        self.speaker.say(Phrase::Initiating);
        self.act("engage", || {
            routines::move_base(&self.controller, &self.speaker)?;
            Ok(true)
        })
    }

    /// Park the arm, switch the LED off and lock the joints.
    pub fn disengage(&self) -> bool {
        info!(target: "roarm::robot", "disengaging");
        self.speaker.say(Phrase::Parked);
        let done = self.act("disengage", || {
            self.write_led(0)?;
            self.controller
                .move_to_pose(PARKED_POSE, None, MotionPolicy::Poll)?;
            self.write_torque(true)?;
            Ok(true)
        });
        self.speaker.wait_idle();
        done
    }

    // ────────────────────────────────────────────────────────────────────
    // Information
    // ────────────────────────────────────────────────────────────────────

    pub fn wifi_info(&self, mode: Mode) -> bool {
        self.read_info(mode, "wifi", ArmCommand::WifiInfo)
    }

    pub fn device_info(&self, mode: Mode) -> bool {
        self.read_info(mode, "device", ArmCommand::DeviceInfo)
    }

    pub fn servos_info(&self, mode: Mode) -> bool {
        self.read_info(mode, "servos", ArmCommand::Feedback)
    }

    fn read_info(&self, mode: Mode, what: &str, command: ArmCommand) -> bool {
        if mode == Mode::Query {
            return true;
        }
        self.act(what, || {
            let reply = self.link().dispatch(&command)?;
            info!(target: "roarm::robot", what, "\n{}", reply.render());
            Ok(true)
        })
    }

    // ────────────────────────────────────────────────────────────────────
    // Torque and LED
    // ────────────────────────────────────────────────────────────────────

    pub fn unlock_torque(&self, mode: Mode) -> bool {
        self.torque(mode, false)
    }

    pub fn lock_torque(&self, mode: Mode) -> bool {
        self.torque(mode, true)
    }

    fn torque(&self, mode: Mode, locked: bool) -> bool {
        match mode {
            Mode::Query => *lock(&self.torque_locked) != Some(locked),
            Mode::Execute => self.act("torque", || self.write_torque(locked).map(|()| true)),
        }
    }

    fn write_torque(&self, locked: bool) -> Result<(), RoarmError> {
        self.link().dispatch(&ArmCommand::Torque { locked })?;
        *lock(&self.torque_locked) = Some(locked);
        Ok(())
    }

    pub fn led_on(&self, mode: Mode) -> bool {
        match mode {
            Mode::Query => !matches!(*lock(&self.led), Some(level) if level > 0),
            Mode::Execute => self.act("led on", || self.write_led(LED_FULL).map(|()| true)),
        }
    }

    pub fn led_off(&self, mode: Mode) -> bool {
        match mode {
            Mode::Query => *lock(&self.led) != Some(0),
            Mode::Execute => self.act("led off", || self.write_led(0).map(|()| true)),
        }
    }

    fn write_led(&self, level: u8) -> Result<(), RoarmError> {
        routines::set_led(self.link(), level)?;
        *lock(&self.led) = Some(level);
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────
    // Motion
    // ────────────────────────────────────────────────────────────────────

    pub fn open_gripper(&self, mode: Mode) -> bool {
        self.gripper(mode, GRIPPER_OPEN)
    }

    pub fn close_gripper(&self, mode: Mode) -> bool {
        self.gripper(mode, GRIPPER_CLOSED)
    }

    fn gripper(&self, mode: Mode, logical: i32) -> bool {
        let target = gripper_firmware_angle(logical);
        match mode {
            Mode::Query => !self.joint_at(JointId::Gripper, target),
            Mode::Execute => self.act("gripper", || {
                let result = if logical == GRIPPER_OPEN {
                    self.controller.open_gripper()?
                } else {
                    self.controller.close_gripper()?
                };
                Ok(result.reached)
            }),
        }
    }

    pub fn move_base(&self, mode: Mode) -> bool {
        match mode {
            Mode::Query => true,
            Mode::Execute => self.act("move base", || {
                routines::move_base(&self.controller, &self.speaker)?;
                Ok(true)
            }),
        }
    }

    pub fn move_left(&self, mode: Mode) -> bool {
        self.swing(mode, BASE_SWING_DEG)
    }

    pub fn move_right(&self, mode: Mode) -> bool {
        self.swing(mode, -BASE_SWING_DEG)
    }

    fn swing(&self, mode: Mode, angle: i32) -> bool {
        match mode {
            Mode::Query => !self.joint_at(JointId::Base, angle),
            Mode::Execute => self.act("swing", || {
                Ok(self.controller.move_joint(JointId::Base, angle)?.reached)
            }),
        }
    }

    pub fn move_parked(&self, mode: Mode) -> bool {
        match mode {
            Mode::Query => !self
                .snapshot()
                .and_then(|t| t.pose().ok())
                .is_some_and(|p| p.within(&PARKED_POSE, &self.settings.margin)),
            Mode::Execute => self.act("park", || {
                let result = self
                    .controller
                    .move_to_pose(PARKED_POSE, None, MotionPolicy::Poll)?;
                Ok(result.reached)
            }),
        }
    }

    fn joint_at(&self, joint: JointId, angle: i32) -> bool {
        self.snapshot()
            .and_then(|t| t.joint_deg(joint).ok())
            .is_some_and(|a| self.settings.margin.angle_within(a, angle))
    }

    // ────────────────────────────────────────────────────────────────────
    // Routines
    // ────────────────────────────────────────────────────────────────────

    pub fn shake_hand(&self, mode: Mode) -> bool {
        self.routine(mode, "handshake", routines::handshake)
    }

    pub fn dance(&self, mode: Mode) -> bool {
        self.routine(mode, "dance", routines::dance)
    }

    pub fn enlight(&self, mode: Mode) -> bool {
        self.routine(mode, "enlight", routines::enlight)
    }

    fn routine(
        &self,
        mode: Mode,
        name: &'static str,
        perform: fn(&Stage<'_>, &CancelToken) -> Result<ChoreographyReport, RoarmError>,
    ) -> bool {
        if mode == Mode::Query {
            return true;
        }
        let run_id = Uuid::new_v4();
        let span = info_span!("routine", routine = name, %run_id);
        let _entered = span.enter();

        let stage = Stage {
            controller: &self.controller,
            speaker: &self.speaker,
            timing: &self.settings.timing,
            dance_media: self.settings.dance_media.as_deref(),
        };
        let cancel = CancelToken::new();
        let result = {
            let _watch = self.interrupts.watch(cancel.clone());
            perform(&stage, &cancel)
        };
        // Routines leave the LED off or untouched; forget what we knew.
        *lock(&self.led) = None;
        self.invalidate_status();

        match result {
            Ok(report) => {
                debug!(target: "roarm::robot", ?report, "routine report");
                true
            }
            Err(e) => {
                error!(target: "roarm::robot", routine = name, error = %e, "routine aborted");
                false
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Voice
    // ────────────────────────────────────────────────────────────────────

    pub fn change_voice(&self, mode: Mode) -> bool {
        match mode {
            Mode::Query => self.speaker.is_present(),
            Mode::Execute => self.speaker.change_gender() != VoiceChange::Unavailable,
        }
    }

    pub fn change_language(&self, target: Language, mode: Mode) -> bool {
        match mode {
            Mode::Query => self.speaker.voice().is_some_and(|v| v.language != target),
            Mode::Execute => self.speaker.change_language(target) != VoiceChange::Unavailable,
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Console
    // ────────────────────────────────────────────────────────────────────

    pub fn send_user_command(&self, mode: Mode) -> bool {
        if mode == Mode::Query {
            return true;
        }
        let summary = {
            let mut console = lock(&self.console);
            run_command_console(self.link(), console.as_mut())
        };
        info!(target: "roarm::robot", forwarded = summary.forwarded, failed = summary.failed, "console closed");
        // Free-form commands may have changed anything.
        *lock(&self.led) = None;
        *lock(&self.torque_locked) = None;
        self.invalidate_status();
        true
    }

    // ────────────────────────────────────────────────────────────────────
    // Helpers
    // ────────────────────────────────────────────────────────────────────

    /// Run an Execute body, log its failure and drop the cached snapshot.
    fn act(&self, what: &str, body: impl FnOnce() -> Result<bool, RoarmError>) -> bool {
        let result = body();
        self.invalidate_status();
        match result {
            Ok(done) => {
                if !done {
                    warn!(target: "roarm::robot", what, "intent did not complete");
                }
                done
            }
            Err(e) => {
                error!(target: "roarm::robot", what, error = %e, "intent failed");
                false
            }
        }
    }

    /// Telemetry for availability queries, refreshed at most once per
    /// `status_ttl`.
    fn snapshot(&self) -> Option<Telemetry> {
        let mut cached = lock(&self.status);
        if let Some((taken, telemetry)) = cached.as_ref()
            && taken.elapsed() < self.settings.status_ttl
        {
            return Some(telemetry.clone());
        }
        match self.link().feedback() {
            Ok(telemetry) => {
                *cached = Some((Instant::now(), telemetry.clone()));
                Some(telemetry)
            }
            Err(e) => {
                debug!(target: "roarm::robot", error = %e, "no telemetry for availability");
                *cached = None;
                None
            }
        }
    }

    fn invalidate_status(&self) {
        *lock(&self.status) = None;
    }
}
