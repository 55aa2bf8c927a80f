//! The choreographed routines: handshake, dance and light show.
//!
//! Each routine is a prelude (moves and a spoken line), a [`Choreography`]
//! with a sound and a light lane, and a final return to the base pose.  The
//! foreground only moves the arm; lanes only talk and drive the LED.

use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use rand::Rng;
use roarm_hal::ArmLink;
use roarm_types::{ArmCommand, Pose, RoarmError};
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::choreography::{Choreography, ChoreographyReport, Lane, LaneContext, Step};
use crate::convergence::{ConvergenceController, MotionPolicy};
use crate::media::ShellMedia;
use crate::phrases::{Phrase, SONG};
use crate::speaker::Speaker;

// ─────────────────────────────────────────────────────────────────────────────
// Poses and levels
// ─────────────────────────────────────────────────────────────────────────────

/// Arm raised, gripper half open, offered for a handshake.
pub const HANDSHAKE_POSE: Pose = Pose::new(175, 235, 325, 145);
pub const HANDSHAKE_SPEED: u32 = 100;
/// The two ends of one shake.
pub const SHAKE_POSES: [Pose; 2] = [Pose::new(245, 310, 215, 180), Pose::new(215, 280, 335, 180)];
pub const SHAKE_SPEED: u32 = 150;
pub const SHAKE_REPEATS: usize = 3;

pub const DANCE_BASE_POSE: Pose = HANDSHAKE_POSE;
pub const DANCE_POSES: [Pose; 5] = [
    Pose::new(-65, 145, 160, 115),
    Pose::new(-140, 320, 355, 180),
    Pose::new(65, 35, 95, 155),
    Pose::new(60, 110, 455, 135),
    Pose::new(12, 400, -75, 170),
];

/// Arm folded up, resting out of the way.
pub const PARKED_POSE: Pose = Pose::new(80, 0, 455, 145);
pub const ENLIGHT_POSE: Pose = Pose::new(424, 75, 168, 180);

pub const LED_FULL: u8 = 255;
const DANCE_LED_LOW: i32 = 10;
const DANCE_LED_HIGH: i32 = 120;
const DANCE_LED_STEP: i32 = 5;
const ENLIGHT_LED_MAX: u8 = 120;
const ENLIGHT_LED_STEP: usize = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Timing
// ─────────────────────────────────────────────────────────────────────────────

/// Waits used by the routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineTiming {
    /// After offering the hand and after a failed grip.
    pub greet_wait: Duration,
    /// At each end of a shake.
    pub shake_settle: Duration,
    pub greet_end_wait: Duration,
    /// Between dance poses.
    pub dance_settle: Duration,
    pub dance_led_interval: Duration,
    /// Between song lines.
    pub song_gap: Duration,
    pub ramp_up_interval: Duration,
    pub ramp_down_interval: Duration,
    /// Pacing of idle foreground loops.
    pub idle_poll: Duration,
}

impl Default for RoutineTiming {
    fn default() -> Self {
        Self {
            greet_wait: Duration::from_secs(2),
            shake_settle: Duration::from_millis(500),
            greet_end_wait: Duration::from_secs(1),
            dance_settle: Duration::from_millis(1200),
            dance_led_interval: Duration::from_millis(20),
            song_gap: Duration::from_millis(250),
            ramp_up_interval: Duration::from_millis(10),
            ramp_down_interval: Duration::from_millis(5),
            idle_poll: Duration::from_millis(100),
        }
    }
}

impl RoutineTiming {
    /// No waits at all, for the simulator in tests.
    pub fn immediate() -> Self {
        Self {
            greet_wait: Duration::ZERO,
            shake_settle: Duration::ZERO,
            greet_end_wait: Duration::ZERO,
            dance_settle: Duration::ZERO,
            dance_led_interval: Duration::from_millis(1),
            song_gap: Duration::from_millis(1),
            ramp_up_interval: Duration::ZERO,
            ramp_down_interval: Duration::ZERO,
            idle_poll: Duration::from_millis(1),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a routine performs with.
pub struct Stage<'a> {
    pub controller: &'a ConvergenceController,
    pub speaker: &'a Speaker,
    pub timing: &'a RoutineTiming,
    /// Shell command played by the dance sound lane instead of singing.
    pub dance_media: Option<&'a str>,
}

impl Stage<'_> {
    fn link(&self) -> &ArmLink {
        self.controller.link()
    }

    fn travel(&self, pose: Pose, speed: Option<u32>, settle: Duration) -> Result<(), RoarmError> {
        self.controller
            .move_to_pose(pose, speed, MotionPolicy::Settle(settle))
            .map(|_| ())
    }

    fn offer_hand(&self) -> Result<(), RoarmError> {
        self.travel(HANDSHAKE_POSE, Some(HANDSHAKE_SPEED), Duration::ZERO)
    }
}

/// Send the arm to its init position and announce readiness.
///
/// # Errors
///
/// Returns the transport error if `T:100` cannot be sent.
pub fn move_base(controller: &ConvergenceController, speaker: &Speaker) -> Result<(), RoarmError> {
    controller.link().dispatch(&ArmCommand::MoveInit)?;
    speaker.say(Phrase::Ready);
    Ok(())
}

/// Set the LED level.
pub fn set_led(link: &ArmLink, level: u8) -> Result<(), RoarmError> {
    link.dispatch(&ArmCommand::Led { level }).map(|_| ())
}

fn finish_at_base(stage: &Stage<'_>) {
    if let Err(e) = move_base(stage.controller, stage.speaker) {
        warn!(target: "roarm::routine", error = %e, "could not return to base");
    }
}

fn lock(gate: &Mutex<()>) -> MutexGuard<'_, ()> {
    gate.lock().unwrap_or_else(|p| p.into_inner())
}

/// Speak `phrase` from a lane unless it is already stopping.  Under `gate`
/// the line cannot land after anything the lane's cleanup says.
fn say_unless_stopped(
    ctx: &LaneContext<'_>,
    gate: &Mutex<()>,
    speaker: &Speaker,
    phrase: Phrase,
) -> bool {
    let _gate = lock(gate);
    if ctx.should_stop() {
        return false;
    }
    speaker.say(phrase);
    true
}

/// Turn a foreground step result into a [`Step`], parking the first error.
fn checked(result: Result<Step, RoarmError>, failure: &mut Option<RoarmError>) -> Step {
    result.unwrap_or_else(|e| {
        *failure = Some(e);
        Step::Done
    })
}

fn outcome(
    report: ChoreographyReport,
    failure: Option<RoarmError>,
) -> Result<ChoreographyReport, RoarmError> {
    match failure {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handshake
// ─────────────────────────────────────────────────────────────────────────────

/// Offer a hand, wait until someone takes it, grip and shake.
///
/// A hand is present once the measured pose leaves the margin around the
/// pose read after the offer.  If the gripper cannot close fully, the hand
/// was pulled away: the arm says so and offers again.
///
/// # Errors
///
/// Returns the first transport error; the arm is still sent to base.
pub fn handshake(stage: &Stage<'_>, cancel: &CancelToken) -> Result<ChoreographyReport, RoarmError> {
    stage.offer_hand()?;
    stage.speaker.say(Phrase::GreetStart);
    thread::sleep(stage.timing.greet_wait);

    let mut origin = stage.controller.read_pose()?;
    let mut failure = None;
    let report = Choreography::new("handshake")
        .lane(Lane::idle("sound"))
        .lane(Lane::idle("light"))
        .run(
            cancel,
            || checked(handshake_step(stage, &mut origin), &mut failure),
            || finish_at_base(stage),
        );
    outcome(report, failure)
}

fn handshake_step(stage: &Stage<'_>, origin: &mut Option<Pose>) -> Result<Step, RoarmError> {
    let controller = stage.controller;
    let current = controller.read_pose()?;
    let (Some(start), Some(current)) = (*origin, current) else {
        if origin.is_none() {
            *origin = current;
        }
        thread::sleep(stage.timing.idle_poll);
        return Ok(Step::Continue);
    };
    if current.within(&start, &controller.margin()) {
        thread::sleep(stage.timing.idle_poll);
        return Ok(Step::Continue);
    }

    info!(target: "roarm::routine", from = %start, to = %current, "hand detected");
    let grip = controller.close_gripper()?;
    if grip.reached {
        stage.speaker.say(Phrase::GreetShake);
        for _ in 0..SHAKE_REPEATS {
            for pose in SHAKE_POSES {
                stage.travel(pose, Some(SHAKE_SPEED), stage.timing.shake_settle)?;
            }
        }
        stage.offer_hand()?;
        stage.speaker.say(Phrase::GreetEnd);
        thread::sleep(stage.timing.greet_end_wait);
        Ok(Step::Done)
    } else {
        stage.speaker.say(Phrase::GreetFail);
        stage.offer_hand()?;
        thread::sleep(stage.timing.greet_wait);
        *origin = controller.read_pose()?;
        Ok(Step::Continue)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dance
// ─────────────────────────────────────────────────────────────────────────────

/// Picks indices at random, never the same one twice in a row.
pub struct PosePicker<R> {
    rng: R,
    len: usize,
    previous: Option<usize>,
}

impl<R: Rng> PosePicker<R> {
    pub fn new(rng: R, len: usize) -> Self {
        Self {
            rng,
            len,
            previous: None,
        }
    }

    /// Next index in `0..len`.  With fewer than two entries the only valid
    /// index is returned every time.
    pub fn pick(&mut self) -> usize {
        if self.len < 2 {
            self.previous = Some(0);
            return 0;
        }
        loop {
            let index = self.rng.random_range(0..self.len);
            if Some(index) != self.previous {
                self.previous = Some(index);
                return index;
            }
        }
    }

    pub fn previous(&self) -> Option<usize> {
        self.previous
    }
}

/// Dance through random poses with a light wave and a song until cancelled.
pub fn dance(stage: &Stage<'_>, cancel: &CancelToken) -> Result<ChoreographyReport, RoarmError> {
    let mut picker = PosePicker::new(rand::rng(), DANCE_POSES.len());
    dance_with(stage, cancel, &mut picker)
}

/// [`dance`] with a caller-supplied picker.
pub fn dance_with<R: Rng>(
    stage: &Stage<'_>,
    cancel: &CancelToken,
    picker: &mut PosePicker<R>,
) -> Result<ChoreographyReport, RoarmError> {
    stage.travel(DANCE_BASE_POSE, Some(HANDSHAKE_SPEED), Duration::ZERO)?;
    stage.speaker.say(Phrase::DanceStart);

    let link = stage.link();
    let speaker = stage.speaker;
    let timing = stage.timing;

    let light_gate = Mutex::new(());
    let light = Lane::new(
        "light",
        |ctx| led_wave(link, &light_gate, ctx, timing.dance_led_interval),
        || {
            let _gate = lock(&light_gate);
            led_off(link);
        },
    );

    let media = stage.dance_media.map(ShellMedia::new);
    let song_gate = Mutex::new(());
    let sound = match &media {
        Some(media) => Lane::new(
            "sound",
            move |ctx| play_media(media, ctx, timing),
            move || {
                media.stop();
                speaker.say(Phrase::DanceEnd);
            },
        ),
        None => Lane::new(
            "sound",
            |ctx| sing(speaker, &song_gate, ctx, timing.song_gap),
            || {
                let _gate = lock(&song_gate);
                speaker.say(Phrase::DanceEnd);
            },
        ),
    };

    let mut failure = None;
    let report = Choreography::new("dance").lane(sound).lane(light).run(
        cancel,
        || {
            let pose = DANCE_POSES[picker.pick()];
            let moved = stage.travel(pose, None, timing.dance_settle);
            checked(moved.map(|()| Step::Continue), &mut failure)
        },
        || {
            if let Err(e) = stage.travel(DANCE_BASE_POSE, Some(HANDSHAKE_SPEED), Duration::ZERO) {
                warn!(target: "roarm::routine", error = %e, "could not leave the dance floor");
            }
            finish_at_base(stage);
        },
    );
    outcome(report, failure)
}

fn led_wave(link: &ArmLink, gate: &Mutex<()>, ctx: &LaneContext<'_>, interval: Duration) {
    let mut level = 0;
    let mut rising = true;
    loop {
        rising = if level > DANCE_LED_HIGH {
            false
        } else if level < DANCE_LED_LOW {
            true
        } else {
            rising
        };
        level += if rising { DANCE_LED_STEP } else { -DANCE_LED_STEP };
        {
            let _gate = lock(gate);
            if ctx.should_stop() {
                return;
            }
            let Ok(value) = u8::try_from(level) else {
                return;
            };
            if let Err(e) = set_led(link, value) {
                warn!(target: "roarm::routine", error = %e, "light lane stopped");
                return;
            }
        }
        if ctx.pause(interval) {
            return;
        }
    }
}

fn led_off(link: &ArmLink) {
    if let Err(e) = set_led(link, 0) {
        warn!(target: "roarm::routine", error = %e, "could not switch the LED off");
    }
}

fn sing(speaker: &Speaker, gate: &Mutex<()>, ctx: &LaneContext<'_>, gap: Duration) {
    for line in SONG.iter().cycle() {
        if !say_unless_stopped(ctx, gate, speaker, *line) {
            return;
        }
        if ctx.pause(gap) {
            return;
        }
    }
}

fn play_media(media: &ShellMedia, ctx: &LaneContext<'_>, timing: &RoutineTiming) {
    while !ctx.should_stop() {
        match media.play() {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                warn!(target: "roarm::routine", error = %e, command = media.command(), "media playback failed");
                while !ctx.pause(timing.idle_poll) {}
                return;
            }
        }
        if ctx.pause(timing.song_gap) {
            return;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Light show
// ─────────────────────────────────────────────────────────────────────────────

/// Point the LED at the operator, fade it up and hold until cancelled.
pub fn enlight(stage: &Stage<'_>, cancel: &CancelToken) -> Result<ChoreographyReport, RoarmError> {
    let link = stage.link();
    let speaker = stage.speaker;
    let timing = stage.timing;

    speaker.say(Phrase::EnlightStart);
    set_led(link, 0)?;
    stage.offer_hand()?;
    stage.travel(ENLIGHT_POSE, None, Duration::ZERO)?;

    let gate = Mutex::new(());
    let light = Lane::new(
        "light",
        |ctx| {
            for level in (0..ENLIGHT_LED_MAX).step_by(ENLIGHT_LED_STEP) {
                {
                    let _gate = lock(&gate);
                    if ctx.should_stop() {
                        return;
                    }
                    if let Err(e) = set_led(link, level) {
                        warn!(target: "roarm::routine", error = %e, "light lane stopped");
                        return;
                    }
                }
                if ctx.pause(timing.ramp_up_interval) {
                    return;
                }
            }
            if !say_unless_stopped(ctx, &gate, speaker, Phrase::EnlightBreak) {
                return;
            }
            while !ctx.pause(timing.idle_poll) {}
        },
        || {
            let _gate = lock(&gate);
            speaker.say(Phrase::EnlightEnd);
            for level in (ENLIGHT_LED_STEP as u8..=ENLIGHT_LED_MAX)
                .rev()
                .step_by(ENLIGHT_LED_STEP)
            {
                if set_led(link, level).is_err() {
                    break;
                }
                thread::sleep(timing.ramp_down_interval);
            }
            led_off(link);
        },
    );

    let report = Choreography::new("enlight")
        .lane(Lane::idle("sound"))
        .lane(light)
        .run(
            cancel,
            || {
                thread::sleep(timing.idle_poll);
                Step::Continue
            },
            || finish_at_base(stage),
        );
    Ok(report)
}
